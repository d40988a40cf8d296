use rand::{rngs::ThreadRng, seq::SliceRandom, Rng};

pub const MIN_FACTOR: u32 = 1;
pub const MAX_FACTOR: u32 = 12;
pub const MAX_CHOICE: u32 = MAX_FACTOR * MAX_FACTOR;
pub const CHOICE_COUNT: usize = 4;

/// A single multiplication fact shown to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub left: u32,
    pub right: u32,
}

impl Question {
    pub fn new(left: u32, right: u32) -> Self {
        Self { left, right }
    }

    pub fn answer(&self) -> u32 {
        self.left * self.right
    }

    /// Build the four candidate answers: the product plus three distinct
    /// distractors drawn from 1..=144, in random order.
    pub fn choices_with<R: Rng>(&self, rng: &mut R) -> Vec<u32> {
        let answer = self.answer();
        let mut options = vec![answer];

        while options.len() < CHOICE_COUNT {
            let candidate = rng.gen_range(1..=MAX_CHOICE);
            if !options.contains(&candidate) {
                options.push(candidate);
            }
        }

        options.shuffle(rng);
        options
    }
}

/// Source of questions for a session
pub trait QuestionSource {
    fn next_question(&mut self) -> Question;

    fn choices_for(&mut self, question: &Question) -> Vec<u32>;
}

/// Uniformly random questions over the 1..=12 times tables
#[derive(Debug, Clone)]
pub struct RandomQuestions<R: Rng = ThreadRng> {
    rng: R,
}

impl RandomQuestions<ThreadRng> {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for RandomQuestions<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RandomQuestions<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> QuestionSource for RandomQuestions<R> {
    fn next_question(&mut self) -> Question {
        Question::new(
            self.rng.gen_range(MIN_FACTOR..=MAX_FACTOR),
            self.rng.gen_range(MIN_FACTOR..=MAX_FACTOR),
        )
    }

    fn choices_for(&mut self, question: &Question) -> Vec<u32> {
        question.choices_with(&mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    #[test]
    fn test_answer_is_product() {
        assert_eq!(Question::new(3, 4).answer(), 12);
        assert_eq!(Question::new(1, 1).answer(), 1);
        assert_eq!(Question::new(12, 12).answer(), 144);
    }

    #[test]
    fn test_generated_operands_in_range() {
        let mut source = RandomQuestions::with_rng(StdRng::seed_from_u64(7));

        for _ in 0..1000 {
            let q = source.next_question();
            assert!((MIN_FACTOR..=MAX_FACTOR).contains(&q.left));
            assert!((MIN_FACTOR..=MAX_FACTOR).contains(&q.right));
            assert_eq!(q.answer(), q.left * q.right);
        }
    }

    #[test]
    fn test_choices_are_four_distinct_values_containing_answer() {
        let mut source = RandomQuestions::with_rng(StdRng::seed_from_u64(42));

        for _ in 0..500 {
            let q = source.next_question();
            let choices = source.choices_for(&q);

            assert_eq!(choices.len(), CHOICE_COUNT);
            let unique: HashSet<u32> = choices.iter().copied().collect();
            assert_eq!(unique.len(), CHOICE_COUNT);
            assert_eq!(choices.iter().filter(|&&c| c == q.answer()).count(), 1);
            assert!(choices.iter().all(|c| (1..=MAX_CHOICE).contains(c)));
        }
    }

    #[test]
    fn test_choices_for_largest_answer() {
        let mut rng = StdRng::seed_from_u64(1);
        let choices = Question::new(12, 12).choices_with(&mut rng);
        assert!(choices.contains(&144));
        assert_eq!(choices.len(), CHOICE_COUNT);
    }

    #[test]
    fn test_answer_position_varies() {
        let mut rng = StdRng::seed_from_u64(99);
        let q = Question::new(3, 4);

        let positions: HashSet<usize> = (0..200)
            .filter_map(|_| q.choices_with(&mut rng).iter().position(|&c| c == 12))
            .collect();

        assert!(positions.len() > 1, "answer should not always sit in one slot");
    }
}
