//! The abstract device that commands are executed against.
//!
//! The [`Machine`] trait has one hook per kind of command. Every hook has a
//! default implementation that updates the shared [`MachineState`] (or does
//! nothing), so output backends only override the hooks that produce output.

use crate::font::{Font, FontProperties};
use crate::matrix::Matrix;
use crate::tfm::{FontMetrics, MetricsProvider};
use crate::Error;
use dvi::Var;
use std::collections::HashMap;
use std::rc::Rc;

/// The DVI registers, in DVI units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub h: f64,
    pub v: f64,
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn var(&self, var: Var) -> f64 {
        match var {
            Var::W => self.w,
            Var::X => self.x,
            Var::Y => self.y,
            Var::Z => self.z,
        }
    }

    pub fn set_var(&mut self, var: Var, value: f64) {
        match var {
            Var::W => self.w = value,
            Var::X => self.x = value,
            Var::Y => self.y = value,
            Var::Z => self.z = value,
        }
    }
}

/// State shared by every machine.
pub struct MachineState {
    pub position: Position,
    stack: Vec<Position>,
    fonts: HashMap<u32, Rc<Font>>,
    font: Option<Rc<Font>>,
    /// Current transform applied to graphical output.
    pub matrix: Matrix,
    graphics_stack: Vec<Matrix>,
    provider: Box<dyn MetricsProvider>,
    metrics: HashMap<String, Rc<FontMetrics>>,
}

impl MachineState {
    pub fn new(provider: impl MetricsProvider + 'static) -> Self {
        MachineState {
            position: Default::default(),
            stack: vec![],
            fonts: Default::default(),
            font: None,
            matrix: Matrix::IDENTITY,
            graphics_stack: vec![],
            provider: Box::new(provider),
            metrics: Default::default(),
        }
    }

    pub fn push(&mut self) {
        self.stack.push(self.position);
    }

    pub fn pop(&mut self) -> Result<(), Error> {
        self.position = self.stack.pop().ok_or(Error::PositionStackUnderflow)?;
        Ok(())
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// The current font, if one has been enabled.
    pub fn font(&self) -> Option<&Rc<Font>> {
        self.font.as_ref()
    }

    pub fn current_font(&self) -> Result<Rc<Font>, Error> {
        self.font.clone().ok_or(Error::NoActiveFont)
    }

    pub fn defined_font(&self, number: u32) -> Option<&Rc<Font>> {
        self.fonts.get(&number)
    }

    /// Returns the metrics for a font, loading them on first use.
    pub fn metrics(&mut self, name: &str) -> Result<Rc<FontMetrics>, Error> {
        if let Some(metrics) = self.metrics.get(name) {
            return Ok(metrics.clone());
        }
        let metrics = Rc::new(self.provider.load(name)?);
        tracing::debug!(font = name, "loaded font metrics");
        self.metrics.insert(name.to_string(), metrics.clone());
        Ok(metrics)
    }
}

/// A device that DVI commands are executed against.
pub trait Machine {
    fn state(&self) -> &MachineState;

    fn state_mut(&mut self) -> &mut MachineState;

    fn preamble(
        &mut self,
        _numerator: u32,
        _denominator: u32,
        _magnification: u32,
        _comment: &str,
    ) -> Result<(), Error> {
        Ok(())
    }

    fn push_color(&mut self, _color: &str) -> Result<(), Error> {
        Ok(())
    }

    fn pop_color(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// Sets the paper size, in points.
    fn set_papersize(&mut self, _width: f64, _height: f64) -> Result<(), Error> {
        Ok(())
    }

    fn push(&mut self) {
        self.state_mut().push()
    }

    fn pop(&mut self) -> Result<(), Error> {
        self.state_mut().pop()
    }

    fn begin_page(&mut self, _parameters: &[i32; 10]) -> Result<(), Error> {
        let state = self.state_mut();
        state.stack.clear();
        state.position = Position::default();
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn post(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn post_post(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// The current position in the coordinates used by graphics specials.
    fn current_position(&self) -> (f64, f64) {
        let p = &self.state().position;
        (p.h, p.v)
    }

    fn set_current_position(&mut self, x: f64, y: f64) {
        let p = &mut self.state_mut().position;
        p.h = x;
        p.v = y;
    }

    /// Draws a rule with its bottom left corner at the current position.
    /// Dimensions are in DVI units.
    fn put_rule(&mut self, _height: i32, _width: i32) -> Result<(), Error> {
        Ok(())
    }

    fn move_right(&mut self, distance: f64) {
        self.state_mut().position.h += distance;
    }

    fn move_down(&mut self, distance: f64) {
        self.state_mut().position.v += distance;
    }

    fn set_font(&mut self, font: Rc<Font>) {
        self.state_mut().font = Some(font);
    }

    /// Registers a font under its number. Later definitions of the same
    /// number are ignored.
    fn define_font(&mut self, number: u32, properties: FontProperties) -> Result<(), Error> {
        if self.state().fonts.contains_key(&number) {
            return Ok(());
        }
        let font = self.load_font(properties)?;
        self.state_mut().fonts.insert(number, font);
        Ok(())
    }

    fn enable_font(&mut self, number: u32) -> Result<(), Error> {
        let font = self
            .state()
            .fonts
            .get(&number)
            .cloned()
            .ok_or(Error::UndefinedFont(number))?;
        self.set_font(font);
        Ok(())
    }

    fn load_font(&mut self, properties: FontProperties) -> Result<Rc<Font>, Error> {
        let metrics = self.state_mut().metrics(&properties.name)?;
        Ok(Rc::new(Font::new(properties, metrics)))
    }

    fn put_svg(&mut self, _svg: &str) -> Result<(), Error> {
        Ok(())
    }

    fn put_html(&mut self, _html: &str) -> Result<(), Error> {
        Ok(())
    }

    /// Typesets text at the current position without moving.
    /// Returns the width of the text in DVI units.
    fn put_text(&mut self, _text: &[u8]) -> Result<f64, Error> {
        Ok(0.0)
    }

    fn matrix(&self) -> &Matrix {
        &self.state().matrix
    }

    fn matrix_mut(&mut self) -> &mut Matrix {
        &mut self.state_mut().matrix
    }

    /// Saves the transform (PostScript `gsave`).
    fn save_graphics_state(&mut self) {
        let state = self.state_mut();
        state.graphics_stack.push(state.matrix);
    }

    /// Restores the last saved transform (PostScript `grestore`).
    fn restore_graphics_state(&mut self) -> Result<(), Error> {
        let state = self.state_mut();
        state.matrix = state
            .graphics_stack
            .pop()
            .ok_or(crate::postscript::Error::GraphicsStackUnderflow)?;
        Ok(())
    }
}

/// A machine that tracks state and produces no output.
pub struct BaseMachine {
    state: MachineState,
}

impl BaseMachine {
    pub fn new(provider: impl MetricsProvider + 'static) -> Self {
        BaseMachine {
            state: MachineState::new(provider),
        }
    }
}

impl Machine for BaseMachine {
    fn state(&self) -> &MachineState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut MachineState {
        &mut self.state
    }
}
