use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::{app::App, quiz::QuizSnapshot, util::format_secs};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const LOW_TIME_SECS: u32 = 5;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let snapshot = self.quiz.snapshot();

        if snapshot.finished {
            render_finished(&snapshot, area, buf);
        } else {
            render_question(&snapshot, area, buf);
        }
    }
}

fn render_question(snapshot: &QuizSnapshot, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let choice_lines = snapshot.choices.len() as u16;
    let content_height = 1 + 1 + 1 + 1 + 1 + 1 + choice_lines + 1 + 1;
    let top_padding = area.height.saturating_sub(content_height + 2) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints(
            [
                Constraint::Length(top_padding),
                Constraint::Length(1),            // question counter + score
                Constraint::Length(1),            // padding
                Constraint::Length(1),            // the fact
                Constraint::Length(1),            // padding
                Constraint::Length(1),            // time left
                Constraint::Length(1),            // padding
                Constraint::Length(choice_lines), // choices
                Constraint::Length(1),            // padding
                Constraint::Length(1),            // feedback
                Constraint::Min(0),
                Constraint::Length(1), // legend
            ]
            .as_ref(),
        )
        .split(area);

    Paragraph::new(Span::styled(
        format!(
            "Question {}/{}   Score {}",
            snapshot.question_number, snapshot.question_count, snapshot.score
        ),
        bold_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Line::from(vec![
        Span::styled(snapshot.question.left.to_string(), bold_style.fg(Color::Cyan)),
        Span::styled(" x ", bold_style.fg(Color::Magenta)),
        Span::styled(snapshot.question.right.to_string(), bold_style.fg(Color::Red)),
        Span::styled(" = ?", bold_style),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    let timer_style = if snapshot.time_remaining <= LOW_TIME_SECS {
        red_bold_style
    } else {
        dim_style
    };
    Paragraph::new(Span::styled(
        format!("Time left: {} s", snapshot.time_remaining),
        timer_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[5], buf);

    let answer = snapshot.question.answer();
    let choices: Vec<Line> = snapshot
        .choices
        .iter()
        .enumerate()
        .map(|(idx, choice)| {
            let style = if !snapshot.result_pending {
                bold_style
            } else if *choice == answer {
                green_bold_style
            } else {
                dim_style
            };
            Line::from(Span::styled(format!("({}) {:>3}", idx + 1, choice), style))
        })
        .collect();
    Paragraph::new(choices)
        .alignment(Alignment::Center)
        .render(chunks[7], buf);

    if snapshot.result_pending {
        let feedback = if snapshot.last_answer_correct {
            Span::styled("Correct!", green_bold_style)
        } else {
            Span::styled(
                format!("Wrong! The correct answer is {}", answer),
                red_bold_style,
            )
        };
        Paragraph::new(feedback)
            .alignment(Alignment::Center)
            .render(chunks[9], buf);
    }

    Paragraph::new(Span::styled("(1-4) answer / (r)estart / (esc)ape", italic_style))
        .render(chunks[11], buf);
}

fn render_finished(snapshot: &QuizSnapshot, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let magenta_style = Style::default().fg(Color::Magenta);
    let cyan_style = Style::default().fg(Color::Cyan);

    let mut lines = vec![
        Line::from(Span::styled(
            format!(
                "Quiz finished! Score: {}/{}",
                snapshot.score, snapshot.question_count
            ),
            bold_style.fg(Color::Magenta),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Total time: {}", format_secs(snapshot.total_elapsed_secs)),
            cyan_style,
        )),
    ];

    if let Some(avg) = snapshot.average_secs {
        lines.push(Line::from(Span::styled(
            format!("Average per question: {}", format_secs(avg)),
            cyan_style,
        )));
    }

    if let Some(best) = snapshot.best_time_secs {
        let mut spans = vec![Span::styled(
            format!("Best time: {}", format_secs(best)),
            magenta_style,
        )];
        if snapshot.new_best {
            spans.push(Span::styled("  new best!", bold_style.fg(Color::Yellow)));
        }
        lines.push(Line::from(spans));
    }

    let content_height = lines.len() as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Min(0),
                Constraint::Length(content_height),
                Constraint::Min(0),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled("(r)estart / (esc)ape", italic_style)).render(chunks[3], buf);
}
