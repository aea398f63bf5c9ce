// ui/sheet.rs

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Widget, Wrap},
};
use strum::IntoEnumIterator;

use super::{
    CombatView, Component, ComponentEnum, Roster,
    constants::SHEET_KEYS,
    draw::{panel, render_header, render_status, too_small},
    widgets::step,
};
use crate::{
    app::{Action, HeroCommand},
    conditions::{ConditionId, condition_definition},
    context::Context,
    hero::{Hero, StaminaState},
    progression,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    PortraitUrl,
    PortraitFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Prompt {
    kind: PromptKind,
    input: String,
}

#[derive(Debug)]
pub struct HeroSheet {
    amount: i32, // Applied by damage and heal.
    condition_cursor: usize,
    prompt: Option<Prompt>,
}

impl Default for HeroSheet {
    fn default() -> Self {
        HeroSheet {
            amount: 1,
            condition_cursor: 0,
            prompt: None,
        }
    }
}

impl HeroSheet {
    pub fn new() -> Self {
        Self::default()
    }

    fn cursor_condition(&self) -> ConditionId {
        ConditionId::iter()
            .nth(self.condition_cursor)
            .unwrap_or(ConditionId::Bleeding)
    }

    fn on_prompt_key(&mut self, key: KeyEvent) -> Option<Action> {
        let prompt = self.prompt.as_mut()?;
        match key.code {
            KeyCode::Esc => {
                self.prompt = None;
                None
            }
            KeyCode::Backspace => {
                prompt.input.pop();
                None
            }
            KeyCode::Enter => {
                let Prompt { kind, input } = self.prompt.take()?;
                let input = input.trim().to_string();
                if input.is_empty() {
                    return Some(Action::RemovePortrait);
                }
                Some(match kind {
                    PromptKind::PortraitUrl => Action::SetPortraitUrl(input),
                    PromptKind::PortraitFile => Action::UploadPortrait(input.into()),
                })
            }
            KeyCode::Char(c) => {
                prompt.input.push(c);
                None
            }
            _ => None,
        }
    }
}

impl Component for HeroSheet {
    fn on_key(&mut self, key: KeyEvent, context: &Context) -> Option<Action> {
        if self.prompt.is_some() {
            return self.on_prompt_key(key);
        }
        let hero = context.hero?;
        let condition = self.cursor_condition();
        let command = match key.code {
            KeyCode::Esc => {
                return Some(Action::SwitchComponent(ComponentEnum::from(Roster::new())));
            }
            KeyCode::Char('c') => {
                return Some(Action::SwitchComponent(ComponentEnum::from(
                    CombatView::new(hero),
                )));
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.amount += 1;
                return None;
            }
            KeyCode::Char('-') => {
                self.amount = (self.amount - 1).max(1);
                return None;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.condition_cursor =
                    step(self.condition_cursor, ConditionId::iter().count(), false);
                return None;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.condition_cursor =
                    step(self.condition_cursor, ConditionId::iter().count(), true);
                return None;
            }
            KeyCode::Char('u') => {
                self.prompt = Some(Prompt {
                    kind: PromptKind::PortraitUrl,
                    input: context.portrait.image_url.clone().unwrap_or_default(),
                });
                return None;
            }
            KeyCode::Char('f') => {
                self.prompt = Some(Prompt {
                    kind: PromptKind::PortraitFile,
                    input: String::new(),
                });
                return None;
            }
            KeyCode::Char('d') => HeroCommand::Damage(self.amount),
            KeyCode::Char('h') => HeroCommand::Heal(self.amount),
            KeyCode::Char('r') => HeroCommand::UseRecovery,
            KeyCode::Char('R') => HeroCommand::Respite,
            KeyCode::Char('v') => HeroCommand::AddVictory,
            KeyCode::Char('L') => HeroCommand::LevelUp,
            KeyCode::Char('>') => HeroCommand::AdjustResource(1),
            KeyCode::Char('<') => HeroCommand::AdjustResource(-1),
            KeyCode::Char(' ') => HeroCommand::ToggleCondition(condition),
            KeyCode::Char('e') if hero.has_condition(condition) => {
                HeroCommand::CycleEndType(condition)
            }
            KeyCode::Char('s') if hero.has_condition(condition) => {
                HeroCommand::AttemptSave(condition)
            }
            _ => return None,
        };
        Some(Action::Hero(command))
    }

    fn render(&self, area: Rect, buffer: &mut Buffer, context: &Context) {
        if too_small(area, buffer) {
            return;
        }
        let Some(hero) = context.hero else {
            Paragraph::new("No hero loaded").render(area, buffer);
            return;
        };

        let [header, body, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(10),
            Constraint::Length(1),
        ])
        .areas(area);
        render_header(buffer, header, &hero.name);

        let [left, right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(body);
        let [stamina_area, stats_area] =
            Layout::vertical([Constraint::Length(3), Constraint::Min(8)]).areas(left);

        render_stamina(buffer, stamina_area, hero);
        self.render_stats(buffer, stats_area, hero, context);
        self.render_conditions(buffer, right, hero);

        let prompt_text = self.prompt.as_ref().map(|prompt| match prompt.kind {
            PromptKind::PortraitUrl => format!("Portrait URL (empty removes): {}_", prompt.input),
            PromptKind::PortraitFile => format!("Image file (empty removes): {}_", prompt.input),
        });
        render_status(
            buffer,
            status,
            prompt_text.as_deref().or(context.status),
            SHEET_KEYS,
        );
    }
}

fn stamina_color(state: StaminaState) -> Color {
    match state {
        StaminaState::Healthy => Color::Green,
        StaminaState::Winded => Color::Yellow,
        StaminaState::Dying => Color::Red,
        StaminaState::Dead => Color::DarkGray,
    }
}

fn render_stamina(buffer: &mut Buffer, area: Rect, hero: &Hero) {
    let state = hero.stamina_state();
    let ratio = if hero.stamina.max > 0 {
        (f64::from(hero.stamina.current) / f64::from(hero.stamina.max)).clamp(0.0, 1.0)
    } else {
        0.0
    };
    Gauge::default()
        .block(panel(" Stamina "))
        .gauge_style(Style::default().fg(stamina_color(state)))
        .ratio(ratio)
        .label(format!(
            "{}/{} ({state}, winded at {})",
            hero.stamina.current, hero.stamina.max, hero.stamina.winded
        ))
        .render(area, buffer);
}

impl HeroSheet {
    fn render_stats(&self, buffer: &mut Buffer, area: Rect, hero: &Hero, context: &Context) {
        let label = Style::default().fg(Color::DarkGray);
        let c = &hero.characteristics;
        let next_level = match progression::xp_to_next_level(hero.level, hero.xp) {
            Some(needed) => format!("{needed} XP to level {}", hero.level + 1),
            None => "max level".to_string(),
        };
        let portrait = if context.portrait.has_portrait() {
            format!("{} portrait", context.portrait.source)
        } else {
            "none".to_string()
        };

        let lines = vec![
            Line::from(vec![
                Span::styled("Class ", label),
                Span::raw(format!("{} ", hero.class_kind())),
                Span::styled("Level ", label),
                Span::raw(format!("{} ", hero.level)),
                Span::styled("XP ", label),
                Span::raw(format!("{} ({})", hero.xp, next_level)),
            ]),
            Line::from(format!(
                "MGT {:+} AGL {:+} REA {:+} INU {:+} PRS {:+}",
                c.might, c.agility, c.reason, c.intuition, c.presence
            )),
            Line::from(vec![
                Span::styled("Recoveries ", label),
                Span::raw(format!(
                    "{}/{} (value {}) ",
                    hero.recoveries.current, hero.recoveries.max, hero.recoveries.value
                )),
                Span::styled("Speed ", label),
                Span::raw(format!("{} ", hero.speed)),
                Span::styled("Stability ", label),
                Span::raw(hero.stability.to_string()),
            ]),
            Line::from(vec![
                Span::styled(format!("{} ", hero.heroic_resource_kind()), label),
                Span::raw(format!("{} ", hero.heroic_resource.current)),
                Span::styled("Surges ", label),
                Span::raw(format!("{} ", hero.surges)),
                Span::styled("Victories ", label),
                Span::raw(hero.victories.to_string()),
            ]),
            Line::from(vec![
                Span::styled("Amount ", label),
                Span::styled(
                    self.amount.to_string(),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
                Span::styled("  Portrait ", label),
                Span::raw(portrait),
            ]),
            Line::from(vec![
                Span::styled("Gear ", label),
                Span::raw(if hero.equipped_items.is_empty() {
                    "nothing equipped".to_string()
                } else {
                    hero.equipped_items
                        .iter()
                        .map(|item| format!("{} ({})", item.name, item.slot))
                        .collect::<Vec<_>>()
                        .join(", ")
                }),
            ]),
        ];
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(panel(" Hero "))
            .render(area, buffer);
    }

    fn render_conditions(&self, buffer: &mut Buffer, area: Rect, hero: &Hero) {
        let mut lines: Vec<Line> = ConditionId::iter()
            .enumerate()
            .map(|(i, id)| {
                let definition = condition_definition(id);
                let marker = if i == self.condition_cursor { "> " } else { "  " };
                match hero.condition(id) {
                    Some(active) => Line::from(vec![
                        Span::raw(marker),
                        Span::styled(
                            definition.name,
                            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(
                            format!("  {}", active.end_type),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]),
                    None => Line::from(vec![
                        Span::raw(marker),
                        Span::styled(definition.name, Style::default().fg(Color::Gray)),
                    ]),
                }
            })
            .collect();

        let selected = condition_definition(self.cursor_condition());
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            selected.primary_effect,
            Style::default().fg(Color::DarkGray),
        )));

        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(panel(" Conditions "))
            .render(area, buffer);
    }
}
