// ui/combat.rs

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
    Component, ComponentEnum, HeroSheet,
    constants::COMBAT_KEYS,
    draw::{panel, render_header, render_status, too_small},
    widgets::step,
};
use crate::{
    app::{Action, CombatCommand},
    context::Context,
    dice::{PowerRollModifier, Tier},
    essence::{self, SummonOptions},
    hero::{Characteristic, Hero},
    summoner::MinionTemplate,
    turn::{HeroPhase, TurnPhase},
};

#[derive(Debug)]
pub struct CombatView {
    characteristic: Characteristic,
    modifier: PowerRollModifier,
    squad_cursor: usize,
    template_cursor: usize,
    amount: i32,
}

impl CombatView {
    /// Starts with the hero's best characteristic selected.
    pub fn new(hero: &Hero) -> Self {
        let characteristic = Characteristic::iter()
            .max_by_key(|c| hero.characteristics.get(*c))
            .unwrap_or(Characteristic::Reason);
        CombatView {
            characteristic,
            modifier: PowerRollModifier::Normal,
            squad_cursor: 0,
            template_cursor: 0,
            amount: 1,
        }
    }

    fn next_characteristic(&mut self) {
        let all: Vec<Characteristic> = Characteristic::iter().collect();
        let index = all
            .iter()
            .position(|c| *c == self.characteristic)
            .unwrap_or(0);
        self.characteristic = all[step(index, all.len(), true)];
    }

    fn templates(hero: &Hero) -> Vec<&'static MinionTemplate> {
        hero.summoner()
            .map(|state| state.portfolio().templates().collect())
            .unwrap_or_default()
    }

    fn selected_template(&self, hero: &Hero) -> Option<&'static MinionTemplate> {
        Self::templates(hero).get(self.template_cursor).copied()
    }

    fn selected_squad_id(&self, hero: &Hero) -> Option<String> {
        hero.summoner()?
            .active_squads
            .get(self.squad_cursor)
            .map(|squad| squad.id.clone())
    }

    fn squad_count(hero: &Hero) -> usize {
        hero.summoner().map_or(0, |state| state.active_squads.len())
    }
}

impl Component for CombatView {
    fn on_key(&mut self, key: KeyEvent, context: &Context) -> Option<Action> {
        let hero = context.hero?;
        let squad_count = Self::squad_count(hero);
        let command = match key.code {
            KeyCode::Esc => {
                return Some(Action::SwitchComponent(ComponentEnum::from(HeroSheet::new())));
            }
            KeyCode::Tab => {
                self.next_characteristic();
                return None;
            }
            KeyCode::Char('m') => {
                self.modifier = self.modifier.cycle();
                return None;
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
                self.squad_cursor = step(self.squad_cursor, squad_count, false);
                return None;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.squad_cursor = step(self.squad_cursor, squad_count, true);
                return None;
            }
            KeyCode::Char('[') => {
                self.template_cursor =
                    step(self.template_cursor, Self::templates(hero).len(), false);
                return None;
            }
            KeyCode::Char(']') => {
                self.template_cursor =
                    step(self.template_cursor, Self::templates(hero).len(), true);
                return None;
            }
            KeyCode::Char(' ') => CombatCommand::PowerRoll {
                characteristic: self.characteristic,
                modifier: self.modifier,
            },
            KeyCode::Char('b') if context.session.in_combat => CombatCommand::End,
            KeyCode::Char('b') => CombatCommand::Start,
            KeyCode::Char('n') => CombatCommand::NewRound,
            KeyCode::Char('p') => CombatCommand::AdvancePhase,
            KeyCode::Char('E') => CombatCommand::EndHeroTurn,
            KeyCode::Char('F') => CombatCommand::ToggleFixture,
            KeyCode::Char(c @ '1'..='6') => {
                let index = c.to_digit(10)? as usize - 1;
                CombatCommand::TogglePhase(HeroPhase::iter().nth(index)?)
            }
            KeyCode::Char('S') => CombatCommand::Summon {
                template_id: self.selected_template(hero)?.id.to_string(),
                target_squad_id: None,
            },
            KeyCode::Char('A') => CombatCommand::Summon {
                template_id: self.selected_template(hero)?.id.to_string(),
                target_squad_id: Some(self.selected_squad_id(hero)?),
            },
            KeyCode::Char('d') => CombatCommand::DamageSquad {
                squad_id: self.selected_squad_id(hero)?,
                amount: self.amount,
            },
            KeyCode::Char('h') => CombatCommand::HealSquad {
                squad_id: self.selected_squad_id(hero)?,
                amount: self.amount,
            },
            KeyCode::Char('x') => {
                let squad_id = self.selected_squad_id(hero)?;
                let candidate = essence::sacrificable_minions(hero)
                    .into_iter()
                    .find(|m| m.squad_id == squad_id && m.can_sacrifice);
                match candidate {
                    Some(minion) => CombatCommand::Sacrifice {
                        minion_id: minion.minion_id,
                    },
                    None => {
                        return Some(Action::Status(
                            "No minion in this squad can be sacrificed".to_string(),
                        ));
                    }
                }
            }
            _ => return None,
        };
        Some(Action::Combat(command))
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
            Constraint::Min(12),
            Constraint::Length(1),
        ])
        .areas(area);
        let subtitle = if context.session.in_combat {
            format!("{} · combat turn {}", hero.name, context.session.combat_turn_number)
        } else {
            format!("{} · out of combat", hero.name)
        };
        render_header(buffer, header, &subtitle);

        let [left, right] =
            Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)])
                .areas(body);
        let [roll_area, turn_area] =
            Layout::vertical([Constraint::Length(9), Constraint::Min(8)]).areas(left);

        self.render_roll(buffer, roll_area, hero, context);
        render_turn(buffer, turn_area, hero, context);
        self.render_minions(buffer, right, hero, context);

        render_status(buffer, status, context.status, COMBAT_KEYS);
    }
}

fn tier_color(tier: Tier) -> Color {
    match tier {
        Tier::One => Color::Red,
        Tier::Two => Color::Yellow,
        Tier::Three => Color::Green,
    }
}

impl CombatView {
    fn render_roll(&self, buffer: &mut Buffer, area: Rect, hero: &Hero, context: &Context) {
        let label = Style::default().fg(Color::DarkGray);
        let mut lines = vec![
            Line::from(vec![
                Span::styled("Stat ", label),
                Span::raw(format!(
                    "{} {:+}  ",
                    self.characteristic,
                    hero.characteristics.get(self.characteristic)
                )),
                Span::styled("Modifier ", label),
                Span::raw(self.modifier.to_string()),
            ]),
            Line::default(),
        ];

        match context.roll_history.latest().filter(|_| context.show_roll) {
            Some(entry) => {
                let roll = &entry.result;
                let [a, b] = roll.kept.dice;
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("{} ", roll.total),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        roll.tier.to_string(),
                        Style::default()
                            .fg(tier_color(roll.tier))
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(if roll.is_critical() { "  critical!" } else { "" }),
                ]));
                lines.push(Line::from(format!(
                    "{a} + {b} {:+} ({})",
                    roll.characteristic, roll.modifier
                )));
                if !roll.discarded.is_empty() {
                    let dropped: Vec<String> = roll
                        .discarded
                        .iter()
                        .map(|pair| format!("{}+{}", pair.dice[0], pair.dice[1]))
                        .collect();
                    lines.push(Line::styled(
                        format!("dropped {}", dropped.join(", ")),
                        label,
                    ));
                }
            }
            None => lines.push(Line::styled("Space to roll 2d10", label)),
        }

        for bane in hero.power_roll_banes() {
            lines.push(Line::styled(bane.reason, Style::default().fg(Color::Red)));
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(panel(" Power roll "))
            .render(area, buffer);
    }

    fn render_minions(&self, buffer: &mut Buffer, area: Rect, hero: &Hero, context: &Context) {
        let Some(state) = hero.summoner() else {
            Paragraph::new("Only summoners command minions.")
                .style(Style::default().fg(Color::DarkGray))
                .block(panel(" Minions "))
                .render(area, buffer);
            return;
        };
        let label = Style::default().fg(Color::DarkGray);

        let mut lines = vec![Line::from(vec![
            Span::styled("Essence ", label),
            Span::styled(
                hero.heroic_resource.current.to_string(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled("  Amount ", label),
            Span::raw(self.amount.to_string()),
            Span::styled("  Fixture ", label),
            Span::raw(match &state.fixture {
                Some(fixture) if fixture.is_active => {
                    format!("{} stamina", fixture.current_stamina)
                }
                _ => "none".to_string(),
            }),
        ])];
        lines.push(Line::default());

        if state.active_squads.is_empty() {
            lines.push(Line::styled("No squads on the field", label));
        }
        for (i, squad) in state.active_squads.iter().enumerate() {
            let name = crate::summoner::find_template(&squad.template_id)
                .map_or(squad.template_id.as_str(), |t| t.name);
            let style = if i == self.squad_cursor {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            lines.push(Line::styled(
                format!(
                    "{}{} x{}  {}/{}",
                    if i == self.squad_cursor { "> " } else { "  " },
                    name,
                    squad.alive_count(),
                    squad.current_stamina,
                    squad.max_stamina
                ),
                style,
            ));
        }

        lines.push(Line::default());
        for (i, template) in Self::templates(hero).into_iter().enumerate() {
            let selected = i == self.template_cursor;
            let validation =
                essence::validate_summon(hero, template, &SummonOptions::default());
            let note = if validation.can_summon {
                String::new()
            } else {
                format!("  ({})", validation.short_reason())
            };
            let style = if selected {
                Style::default().fg(Color::Yellow)
            } else if validation.can_summon {
                Style::default()
            } else {
                label
            };
            lines.push(Line::styled(
                format!(
                    "{}{} [{}]{}",
                    if selected { "» " } else { "  " },
                    template.name,
                    template.essence_cost,
                    note
                ),
                style,
            ));
        }

        let title = if context.session.in_combat {
            format!(" Minions · {} ", context.session.summoner_turn.current_phase)
        } else {
            " Minions ".to_string()
        };
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(panel(&title))
            .render(area, buffer);
    }
}

fn render_turn(buffer: &mut Buffer, area: Rect, hero: &Hero, context: &Context) {
    let session = context.session;
    let mut lines: Vec<Line> = HeroPhase::iter()
        .enumerate()
        .map(|(i, phase)| {
            let done = session.hero_turn.is_complete(phase);
            Line::styled(
                format!("{} [{}] {}", i + 1, if done { "x" } else { " " }, phase),
                if done {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                },
            )
        })
        .collect();

    if hero.summoner().is_some() {
        lines.push(Line::default());
        let phases: Vec<Span> = TurnPhase::iter()
            .map(|phase| {
                if phase == session.summoner_turn.current_phase {
                    Span::styled(
                        format!("[{phase}] "),
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::styled(format!("{phase} "), Style::default().fg(Color::DarkGray))
                }
            })
            .collect();
        lines.push(Line::from(phases));
    }

    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(panel(&format!(
            " Turn {} · round {} ",
            session.hero_turn.turn_number, session.summoner_turn.round_number
        )))
        .render(area, buffer);
}
