// ui/new_hero.rs

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use strum::IntoEnumIterator;

use super::{
    Component, ComponentEnum, Roster,
    constants::NEW_HERO_KEYS,
    draw::{center_rect, panel, render_header, render_status, too_small},
    widgets::step,
};
use crate::{app::Action, context::Context, hero::ClassKind};

const MAX_NAME_LEN: usize = 40;

#[derive(Debug, Default)]
pub struct NewHero {
    name: String,
    class_index: usize,
}

impl NewHero {
    fn classes() -> Vec<ClassKind> {
        ClassKind::iter().collect()
    }

    fn class(&self) -> ClassKind {
        Self::classes()
            .get(self.class_index)
            .copied()
            .unwrap_or(ClassKind::Summoner)
    }
}

impl Component for NewHero {
    fn on_key(&mut self, key: KeyEvent, _context: &Context) -> Option<Action> {
        let class_count = Self::classes().len();
        match key.code {
            KeyCode::Esc => Some(Action::SwitchComponent(ComponentEnum::from(Roster::new()))),
            KeyCode::Left => {
                self.class_index = step(self.class_index, class_count, false);
                None
            }
            KeyCode::Right | KeyCode::Tab => {
                self.class_index = step(self.class_index, class_count, true);
                None
            }
            KeyCode::Backspace => {
                self.name.pop();
                None
            }
            KeyCode::Enter => {
                let name = self.name.trim();
                if name.is_empty() {
                    Some(Action::Status("A hero needs a name".to_string()))
                } else {
                    Some(Action::NewHero {
                        name: name.to_string(),
                        class: self.class(),
                    })
                }
            }
            KeyCode::Char(c) if self.name.chars().count() < MAX_NAME_LEN => {
                self.name.push(c);
                None
            }
            _ => None,
        }
    }

    fn render(&self, area: Rect, buffer: &mut Buffer, context: &Context) {
        if too_small(area, buffer) {
            return;
        }
        let [header, body, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(10),
            Constraint::Length(1),
        ])
        .areas(area);
        render_header(buffer, header, "New hero");

        let form = center_rect(body, Constraint::Length(60), Constraint::Length(12));
        let class = self.class();
        let classes: Vec<Span> = Self::classes()
            .into_iter()
            .map(|kind| {
                if kind == class {
                    Span::styled(
                        format!(" {kind} "),
                        Style::default()
                            .fg(Color::Black)
                            .bg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw(format!(" {kind} "))
                }
            })
            .collect();

        let lines = vec![
            Line::from(vec![
                Span::styled("Name: ", Style::default().fg(Color::DarkGray)),
                Span::raw(self.name.clone()),
                Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            ]),
            Line::default(),
            Line::from(Span::styled("Class:", Style::default().fg(Color::DarkGray))),
            Line::from(classes),
            Line::default(),
            Line::from(format!(
                "Stamina {} · Recoveries {} · {}",
                class.starting_stamina(),
                class.starting_recoveries(),
                class.resource_kind()
            )),
        ];
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(panel(" Create a hero "))
            .render(form, buffer);

        render_status(buffer, status, context.status, NEW_HERO_KEYS);
    }
}
