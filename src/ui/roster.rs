// ui/roster.rs

use chrono::{Local, TimeZone};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph, StatefulWidget, Widget},
};

use super::{
    Component, ComponentEnum, NewHero,
    constants::ROSTER_KEYS,
    draw::{panel, render_header, render_status, render_title, too_small},
    widgets::step,
};
use crate::{app::Action, context::Context};

#[derive(Debug, Default)]
pub struct Roster {
    selected: usize,
    backspace_counter: bool, // Armed by the first Backspace, fires on the second.
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    fn selected_id(&self, context: &Context) -> Option<String> {
        context
            .characters
            .get(self.selected)
            .map(|stored| stored.id.clone())
    }
}

impl Component for Roster {
    fn on_key(&mut self, key: KeyEvent, context: &Context) -> Option<Action> {
        let count = context.characters.len();
        if key.code != KeyCode::Backspace {
            self.backspace_counter = false;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = step(self.selected, count, false);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = step(self.selected, count, true);
                None
            }
            KeyCode::Enter | KeyCode::Char('l') => self.selected_id(context).map(Action::LoadHero),
            KeyCode::Char('n') => Some(Action::SwitchComponent(ComponentEnum::from(
                NewHero::default(),
            ))),
            KeyCode::Char('c') => self.selected_id(context).map(Action::DuplicateHero),
            KeyCode::Char('x') => self.selected_id(context).map(Action::ExportHero),
            KeyCode::Char('i') => Some(Action::OpenImport),
            KeyCode::Backspace => {
                if self.backspace_counter {
                    self.backspace_counter = false;
                    let action = self.selected_id(context).map(Action::DeleteHero);
                    self.selected = self.selected.min(count.saturating_sub(2));
                    action
                } else {
                    self.backspace_counter = count > 0;
                    None
                }
            }
            KeyCode::Char(c) => c.to_digit(10).and_then(|digit| {
                let index = (digit as usize).checked_sub(1)?;
                let stored = context.characters.get(index)?;
                self.selected = index;
                Some(Action::LoadHero(stored.id.clone()))
            }),
            _ => None,
        }
    }

    fn render(&self, area: Rect, buffer: &mut Buffer, context: &Context) {
        if too_small(area, buffer) {
            return;
        }
        let [header, title, list, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(8),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .areas(area);

        render_header(buffer, header, "Heroes");
        render_title(buffer, title);
        self.render_list(buffer, list, context);

        let status_text = if self.backspace_counter {
            Some("Press Backspace again to delete this hero")
        } else {
            context.status
        };
        render_status(buffer, status, status_text, ROSTER_KEYS);
    }
}

impl Roster {
    fn render_list(&self, buffer: &mut Buffer, area: Rect, context: &Context) {
        let block = panel(" Roster ");
        if context.characters.is_empty() {
            Paragraph::new("No heroes yet. Press n to create one or i to import.")
                .style(Style::default().fg(Color::Yellow))
                .block(block)
                .render(area, buffer);
            return;
        }

        let items: Vec<ListItem> = context
            .characters
            .iter()
            .enumerate()
            .map(|(i, stored)| {
                let modified = Local
                    .timestamp_millis_opt(stored.last_modified)
                    .single()
                    .map(|time| time.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                ListItem::new(Line::from(vec![
                    Span::raw(format!("{}. ", i + 1)),
                    Span::styled(
                        stored.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!("  L{} {}", stored.level, stored.hero_class)),
                    Span::styled(format!("  {modified}"), Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect();

        let highlight = if self.backspace_counter {
            Style::default().fg(Color::Red).rapid_blink()
        } else {
            Style::default().fg(Color::Yellow)
        };
        let list = List::new(items)
            .block(block)
            .highlight_style(highlight)
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(self.selected));
        StatefulWidget::render(list, area, buffer, &mut state);
    }
}
