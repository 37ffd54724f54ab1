use glam::{Mat4, Vec3};
use sdl2::keyboard::Scancode;
use std::f32::consts::FRAC_PI_2;

use crate::engine::input::{InputEvent, InputState};
use crate::renderer::light::{LightKind, LightState};
use crate::ui::text::TextRenderer;

const PANEL_SCALE: f32 = 2.0;
const PANEL_MARGIN: f32 = 8.0;
const LINE_HEIGHT: f32 = 8.0 * PANEL_SCALE + 4.0;

const TITLE_COLOR: Vec3 = Vec3::new(1.0, 1.0, 0.0);
const ROW_COLOR: Vec3 = Vec3::new(0.7, 0.7, 0.7);
const SELECTED_COLOR: Vec3 = Vec3::new(1.0, 0.9, 0.2);

const COLOR_RATE: f32 = 0.8;
const DIRECTION_RATE: f32 = 0.6;
const POSITION_RATE: f32 = 6.0;
const ANGLE_RATE: f32 = 0.5;
const MIN_CONE_ANGLE: f32 = 0.01;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum PanelRow {
    ColorR,
    ColorG,
    ColorB,
    PcfKernel,
    DirectionX,
    DirectionY,
    DirectionZ,
    PositionX,
    PositionY,
    PositionZ,
    Constant,
    Linear,
    Quadratic,
    CutOff,
    OuterCutOff,
}

use PanelRow::*;

fn rows_for(kind: &LightKind) -> &'static [PanelRow] {
    match kind {
        LightKind::Directional { .. } => &[
            ColorR, ColorG, ColorB, PcfKernel, DirectionX, DirectionY, DirectionZ,
        ],
        LightKind::Point { .. } => &[
            ColorR, ColorG, ColorB, PcfKernel, PositionX, PositionY, PositionZ, Constant, Linear,
            Quadratic,
        ],
        LightKind::Spot { .. } => &[
            ColorR, ColorG, ColorB, PcfKernel, DirectionX, DirectionY, DirectionZ, PositionX,
            PositionY, PositionZ, Constant, Linear, Quadratic, CutOff, OuterCutOff,
        ],
    }
}

/// Immediate-mode light editor: Up/Down selects a parameter, holding
/// Left/Right adjusts it through the light's setters. `edit` reports
/// whether anything changed this frame so the caller can re-upload its
/// light buffer.
pub struct LightPanel {
    visible: bool,
    selected: usize,
}

impl LightPanel {
    pub fn new() -> Self {
        Self {
            visible: false,
            selected: 0,
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn reset_selection(&mut self) {
        self.selected = 0;
    }

    pub fn edit(&mut self, input: &InputState, state: &mut LightState, dt: f32) -> bool {
        if !self.visible {
            return false;
        }

        let rows = rows_for(state.kind());
        self.selected = self.selected.min(rows.len() - 1);

        let mut stepped = 0i32;
        for event in &input.events {
            match event {
                InputEvent::KeyPressed(Scancode::Up) => {
                    self.selected = if self.selected == 0 {
                        rows.len() - 1
                    } else {
                        self.selected - 1
                    };
                }
                InputEvent::KeyPressed(Scancode::Down) => {
                    self.selected = (self.selected + 1) % rows.len();
                }
                InputEvent::KeyPressed(Scancode::Left) => stepped -= 1,
                InputEvent::KeyPressed(Scancode::Right) => stepped += 1,
                _ => {}
            }
        }

        let row = rows[self.selected];
        if row == PcfKernel {
            // integer parameter, edge-stepped
            if stepped == 0 {
                return false;
            }
            let size = (state.pcf_kernel_size() + stepped).clamp(0, 10);
            if size == state.pcf_kernel_size() {
                return false;
            }
            state.set_pcf_kernel_size(size);
            return true;
        }

        let mut delta = 0.0;
        if input.is_key_held(Scancode::Left) {
            delta -= dt;
        }
        if input.is_key_held(Scancode::Right) {
            delta += dt;
        }
        if delta == 0.0 {
            return false;
        }

        adjust(state, row, delta)
    }

    pub fn draw(
        &self,
        text: &mut TextRenderer,
        name: &str,
        state: &LightState,
        projection: &Mat4,
    ) {
        if !self.visible {
            return;
        }

        let rows = rows_for(state.kind());
        let x = PANEL_MARGIN;
        let mut y = PANEL_MARGIN;

        let title = format!("{} ({})", name, state.kind().name());
        text.draw_text(&title, x, y, PANEL_SCALE, TITLE_COLOR, projection);
        y += LINE_HEIGHT * 1.5;

        for (i, &row) in rows.iter().enumerate() {
            let selected = i == self.selected.min(rows.len() - 1);
            let color = if selected { SELECTED_COLOR } else { ROW_COLOR };
            let marker = if selected { ">" } else { " " };
            let line = format!("{} {:<12} {}", marker, label(row), value_text(row, state));
            text.draw_text(&line, x, y, PANEL_SCALE, color, projection);
            y += LINE_HEIGHT;
        }
    }
}

impl Default for LightPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn label(row: PanelRow) -> &'static str {
    match row {
        ColorR => "COLOR R",
        ColorG => "COLOR G",
        ColorB => "COLOR B",
        PcfKernel => "PCF KERNEL",
        DirectionX => "DIR X",
        DirectionY => "DIR Y",
        DirectionZ => "DIR Z",
        PositionX => "POS X",
        PositionY => "POS Y",
        PositionZ => "POS Z",
        Constant => "CONSTANT",
        Linear => "LINEAR",
        Quadratic => "QUADRATIC",
        CutOff => "CUTOFF",
        OuterCutOff => "OUTER CUTOFF",
    }
}

fn value_text(row: PanelRow, state: &LightState) -> String {
    match row {
        ColorR => format!("{:.2}", state.color().x),
        ColorG => format!("{:.2}", state.color().y),
        ColorB => format!("{:.2}", state.color().z),
        PcfKernel => format!("{}", state.pcf_kernel_size()),
        DirectionX => format!("{:.2}", state.direction().unwrap_or_default().x),
        DirectionY => format!("{:.2}", state.direction().unwrap_or_default().y),
        DirectionZ => format!("{:.2}", state.direction().unwrap_or_default().z),
        PositionX => format!("{:.1}", state.position().x),
        PositionY => format!("{:.1}", state.position().y),
        PositionZ => format!("{:.1}", state.position().z),
        Constant => format!("{:.3}", state.attenuation().map_or(0.0, |a| a.constant)),
        Linear => format!("{:.3}", state.attenuation().map_or(0.0, |a| a.linear)),
        Quadratic => format!("{:.4}", state.attenuation().map_or(0.0, |a| a.quadratic)),
        CutOff => format!(
            "{:.1} DEG",
            state.cut_off().map_or(0.0, |c| c.acos().to_degrees())
        ),
        OuterCutOff => format!(
            "{:.1} DEG",
            state.outer_cut_off().map_or(0.0, |c| c.acos().to_degrees())
        ),
    }
}

fn adjust(state: &mut LightState, row: PanelRow, delta: f32) -> bool {
    match row {
        ColorR | ColorG | ColorB => {
            let mut color = state.color();
            let channel = match row {
                ColorR => &mut color.x,
                ColorG => &mut color.y,
                _ => &mut color.z,
            };
            *channel = (*channel + delta * COLOR_RATE).clamp(0.0, 10.0);
            state.set_color(color);
            true
        }
        DirectionX | DirectionY | DirectionZ => {
            let Some(mut direction) = state.direction() else {
                return false;
            };
            let axis = match row {
                DirectionX => &mut direction.x,
                DirectionY => &mut direction.y,
                _ => &mut direction.z,
            };
            *axis = (*axis + delta * DIRECTION_RATE).clamp(-1.0, 1.0);
            state.set_direction(direction);
            true
        }
        PositionX | PositionY | PositionZ => {
            if matches!(state.kind(), LightKind::Directional { .. }) {
                return false;
            }
            let mut position = state.position();
            let axis = match row {
                PositionX => &mut position.x,
                PositionY => &mut position.y,
                _ => &mut position.z,
            };
            *axis += delta * POSITION_RATE;
            state.set_position(position);
            true
        }
        Constant | Linear | Quadratic => {
            let Some(mut attenuation) = state.attenuation() else {
                return false;
            };
            match row {
                Constant => {
                    attenuation.constant = (attenuation.constant + delta * 0.5).clamp(0.0, 1.0)
                }
                Linear => attenuation.linear = (attenuation.linear + delta * 0.1).clamp(0.0, 0.25),
                _ => {
                    attenuation.quadratic =
                        (attenuation.quadratic + delta * 0.05).clamp(0.0, 0.1)
                }
            }
            state.set_attenuation(attenuation);
            true
        }
        CutOff => {
            let (Some(inner), Some(outer)) = (state.cut_off(), state.outer_cut_off()) else {
                return false;
            };
            // edited in angle space, stored as cosine; inner cone never
            // exceeds the outer cone
            let outer_angle = outer.acos();
            let inner_angle =
                (inner.acos() + delta * ANGLE_RATE).clamp(MIN_CONE_ANGLE, outer_angle);
            state.set_cut_off(inner_angle.cos());
            true
        }
        OuterCutOff => {
            let (Some(inner), Some(outer)) = (state.cut_off(), state.outer_cut_off()) else {
                return false;
            };
            let outer_angle =
                (outer.acos() + delta * ANGLE_RATE).clamp(MIN_CONE_ANGLE, FRAC_PI_2);
            state.set_outer_cut_off(outer_angle.cos());
            if inner.acos() > outer_angle {
                state.set_cut_off(outer_angle.cos());
            }
            true
        }
        PcfKernel => false, // edge-stepped in edit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::light::{Attenuation, DEFAULT_SHADOW_FAR, DEFAULT_SHADOW_MAP_RES};

    fn spot_state() -> LightState {
        LightState::spot(
            Vec3::ONE,
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::new(0.0, -1.0, 0.1),
            Attenuation::new(1.0, 0.09, 0.032),
            0.3,
            0.5,
            DEFAULT_SHADOW_FAR,
            DEFAULT_SHADOW_MAP_RES,
        )
    }

    fn held(sc: Scancode) -> InputState {
        let mut input = InputState::new();
        input.keys.insert(sc);
        input
    }

    #[test]
    fn row_sets_match_light_kind() {
        let directional = LightState::directional(
            Vec3::ONE,
            Vec3::NEG_Y,
            DEFAULT_SHADOW_FAR,
            DEFAULT_SHADOW_MAP_RES,
        );
        assert_eq!(rows_for(directional.kind()).len(), 7);
        assert_eq!(rows_for(spot_state().kind()).len(), 15);
        assert!(!rows_for(directional.kind()).contains(&PositionX));
    }

    #[test]
    fn hidden_panel_never_reports_changes() {
        let panel = &mut LightPanel::new();
        let mut state = spot_state();
        assert!(!panel.edit(&held(Scancode::Right), &mut state, 0.016));
    }

    #[test]
    fn selection_wraps_both_ways() {
        let mut panel = LightPanel::new();
        panel.toggle();
        let mut state = spot_state();

        let mut input = InputState::new();
        input.events.push(InputEvent::KeyPressed(Scancode::Up));
        panel.edit(&input, &mut state, 0.016);
        assert_eq!(panel.selected, rows_for(state.kind()).len() - 1);

        input.events.clear();
        input.events.push(InputEvent::KeyPressed(Scancode::Down));
        panel.edit(&input, &mut state, 0.016);
        assert_eq!(panel.selected, 0);
    }

    #[test]
    fn holding_right_raises_selected_color_channel() {
        let mut panel = LightPanel::new();
        panel.toggle();
        let mut state = spot_state();
        let before = state.color().x;

        let changed = panel.edit(&held(Scancode::Right), &mut state, 0.1);
        assert!(changed);
        assert!(state.color().x > before);
    }

    #[test]
    fn pcf_kernel_steps_on_key_press() {
        let mut panel = LightPanel::new();
        panel.toggle();
        let mut state = spot_state();
        // move selection onto the PCF row
        panel.selected = 3;

        let mut input = InputState::new();
        input.events.push(InputEvent::KeyPressed(Scancode::Right));
        assert!(panel.edit(&input, &mut state, 0.016));
        assert_eq!(state.pcf_kernel_size(), 2);

        // clamped at the bottom end
        let mut input = InputState::new();
        input.events.push(InputEvent::KeyPressed(Scancode::Left));
        input.events.push(InputEvent::KeyPressed(Scancode::Left));
        state.set_pcf_kernel_size(0);
        assert!(!panel.edit(&input, &mut state, 0.016));
    }

    #[test]
    fn outer_cutoff_edit_drags_inner_cone_along() {
        let mut state = spot_state();
        // shrink the outer cone well below the inner cone
        assert!(adjust(&mut state, OuterCutOff, -0.8));
        let inner = state.cut_off().unwrap().acos();
        let outer = state.outer_cut_off().unwrap().acos();
        assert!(inner <= outer + 1e-5);
    }

    #[test]
    fn attenuation_edit_respects_clamp() {
        let mut state = spot_state();
        assert!(adjust(&mut state, Linear, 100.0));
        assert!((state.attenuation().unwrap().linear - 0.25).abs() < 1e-6);
    }
}
