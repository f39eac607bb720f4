//! A small PostScript interpreter.
//!
//! Only the operators needed for the output of `\scalebox`, `\rotatebox`,
//! `\resizebox` and similar graphics commands are supported.
//! Transform operators act on the [`Machine`]'s current matrix and the
//! `gsave`/`grestore` stack is owned by the machine.

use crate::machine::Machine;
use lexer::{Lexer, Token};

mod lexer;

/// Error returned when PostScript code cannot be run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("unterminated string")]
    UnterminatedString,
    #[error("unterminated procedure")]
    UnterminatedProcedure,
    #[error("escape character at end of input")]
    TrailingEscape,
    #[error("unknown operator `{0}`")]
    UnknownOperator(String),
    #[error("`{0}` needs more operands than are on the stack")]
    StackUnderflow(String),
    #[error("`{operator}` expects a {expected} operand")]
    TypeMismatch {
        operator: String,
        expected: &'static str,
    },
    #[error("`]` without a matching `[`")]
    UnmatchedArrayEnd,
    #[error("grestore with no saved graphics state")]
    GraphicsStackUnderflow,
}

/// A value on the operand stack.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Number(f64),
    String(String),
    Array(Vec<Object>),
    Mark,
    Name(String),
    Procedure(String),
}

#[derive(Debug, Default)]
pub struct Interpreter {
    stack: Vec<Object>,
}

impl Interpreter {
    pub fn new() -> Self {
        Default::default()
    }

    /// The operand stack, bottom first.
    pub fn stack(&self) -> &[Object] {
        &self.stack
    }

    pub fn execute(&mut self, machine: &mut dyn Machine, input: &str) -> Result<(), crate::Error> {
        for token in Lexer::new(input) {
            match token? {
                Token::Number(n) => self.stack.push(Object::Number(n)),
                Token::String(s) => self.stack.push(Object::String(s.to_string())),
                Token::Name(s) => self.stack.push(Object::Name(s.to_string())),
                Token::Procedure(s) => self.stack.push(Object::Procedure(s.to_string())),
                Token::ArrayStart => self.stack.push(Object::Mark),
                Token::ArrayEnd => {
                    let mark = self
                        .stack
                        .iter()
                        .rposition(|o| *o == Object::Mark)
                        .ok_or(Error::UnmatchedArrayEnd)?;
                    let elements = self.stack.split_off(mark + 1);
                    self.stack.pop();
                    self.stack.push(Object::Array(elements));
                }
                Token::Operator(name) => self.operator(machine, name)?,
            }
        }
        Ok(())
    }

    fn operator(&mut self, machine: &mut dyn Machine, name: &str) -> Result<(), crate::Error> {
        match name {
            "pop" => {
                self.pop(name)?;
            }
            "exch" => {
                let x = self.pop(name)?;
                let y = self.pop(name)?;
                self.stack.push(x);
                self.stack.push(y);
            }
            "dup" => {
                let x = self
                    .stack
                    .last()
                    .cloned()
                    .ok_or_else(|| Error::StackUnderflow(name.into()))?;
                self.stack.push(x);
            }
            "mark" => self.stack.push(Object::Mark),
            "neg" => {
                let x = self.pop_number(name)?;
                self.stack.push(Object::Number(-x));
            }
            "add" | "sub" | "mul" | "div" => {
                let x = self.pop_number(name)?;
                let y = self.pop_number(name)?;
                let result = match name {
                    "add" => y + x,
                    "sub" => y - x,
                    "mul" => y * x,
                    _ => y / x,
                };
                self.stack.push(Object::Number(result));
            }
            "gsave" => machine.save_graphics_state(),
            "grestore" => machine.restore_graphics_state()?,
            "currentpoint" => {
                let (x, y) = machine.current_position();
                self.stack.push(Object::Number(x));
                self.stack.push(Object::Number(y));
            }
            "moveto" => {
                let (x, y) = self.pop_pair(name)?;
                machine.set_current_position(x, y);
            }
            "scale" => {
                let (x, y) = self.pop_pair(name)?;
                machine.matrix_mut().scale(x, y);
            }
            "translate" => {
                let (x, y) = self.pop_pair(name)?;
                machine.matrix_mut().translate(x, y);
            }
            "rotate" => {
                let degrees = self.pop_number(name)?;
                machine.matrix_mut().rotate(degrees);
            }
            _ => return Err(Error::UnknownOperator(name.into()).into()),
        }
        Ok(())
    }

    fn pop(&mut self, operator: &str) -> Result<Object, Error> {
        self.stack
            .pop()
            .ok_or_else(|| Error::StackUnderflow(operator.into()))
    }

    fn pop_number(&mut self, operator: &str) -> Result<f64, Error> {
        match self.pop(operator)? {
            Object::Number(n) => Ok(n),
            _ => Err(Error::TypeMismatch {
                operator: operator.into(),
                expected: "number",
            }),
        }
    }

    /// Pops `x y`, where `y` is on top.
    fn pop_pair(&mut self, operator: &str) -> Result<(f64, f64), Error> {
        let y = self.pop_number(operator)?;
        let x = self.pop_number(operator)?;
        Ok((x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::BaseMachine;
    use crate::matrix::Matrix;
    use crate::tfm::FontMetrics;
    use std::collections::HashMap;

    fn machine() -> BaseMachine {
        BaseMachine::new(HashMap::<String, FontMetrics>::new())
    }

    fn run(input: &str) -> Result<(Vec<Object>, BaseMachine), crate::Error> {
        let mut m = machine();
        let mut interpreter = Interpreter::new();
        interpreter.execute(&mut m, input)?;
        Ok((interpreter.stack().to_vec(), m))
    }

    fn numbers(input: &str) -> Vec<f64> {
        run(input)
            .unwrap()
            .0
            .into_iter()
            .map(|o| match o {
                Object::Number(n) => n,
                other => panic!("not a number: {other:?}"),
            })
            .collect()
    }

    #[test]
    fn arithmetic() {
        assert_eq!(numbers("7 2 sub"), vec![5.0]);
        assert_eq!(numbers("8 2 div"), vec![4.0]);
        assert_eq!(numbers("3 4 add 2 mul neg"), vec![-14.0]);
    }

    #[test]
    fn stack_operators() {
        assert_eq!(numbers("1 2 exch"), vec![2.0, 1.0]);
        assert_eq!(numbers("1 dup"), vec![1.0, 1.0]);
        assert_eq!(numbers("1 2 pop"), vec![1.0]);
    }

    #[test]
    fn arrays() {
        let (stack, _) = run("0 [1 /a (s) {p}]").unwrap();
        assert_eq!(
            stack,
            vec![
                Object::Number(0.0),
                Object::Array(vec![
                    Object::Number(1.0),
                    Object::Name("a".into()),
                    Object::String("s".into()),
                    Object::Procedure("p".into()),
                ]),
            ]
        );
        assert!(matches!(
            run("1 ]"),
            Err(crate::Error::PostScript(Error::UnmatchedArrayEnd))
        ));
    }

    #[test]
    fn mark() {
        let (stack, _) = run("mark 1 2 ]").unwrap();
        assert_eq!(
            stack,
            vec![Object::Array(vec![Object::Number(1.0), Object::Number(2.0)])]
        );
        let (stack, _) = run("1 mark exch").unwrap();
        assert_eq!(stack, vec![Object::Mark, Object::Number(1.0)]);
        let (stack, _) = run("mark [3] ]").unwrap();
        assert_eq!(
            stack,
            vec![Object::Array(vec![Object::Array(vec![Object::Number(3.0)])])]
        );
    }

    #[test]
    fn transforms() {
        let (_, m) = run("10 20 translate 2 3 scale").unwrap();
        let mut want = Matrix::default();
        want.translate(10.0, 20.0).scale(2.0, 3.0);
        assert_eq!(*m.matrix(), want);
    }

    #[test]
    fn gsave_and_grestore() {
        let (_, m) = run("gsave 45 rotate grestore").unwrap();
        assert!(m.matrix().is_identity());
        assert!(matches!(
            run("grestore"),
            Err(crate::Error::PostScript(Error::GraphicsStackUnderflow))
        ));
    }

    #[test]
    fn graphics_stack_outlives_the_interpreter() {
        let mut m = machine();
        Interpreter::new().execute(&mut m, "gsave 2 2 scale").unwrap();
        Interpreter::new().execute(&mut m, "grestore").unwrap();
        assert!(m.matrix().is_identity());
    }

    #[test]
    fn current_point_and_moveto() {
        let mut m = machine();
        m.move_right(5.0);
        m.move_down(6.0);
        let mut interpreter = Interpreter::new();
        interpreter
            .execute(&mut m, "currentpoint 1 add exch 2 add exch moveto")
            .unwrap();
        assert_eq!(m.current_position(), (7.0, 7.0));
        assert!(interpreter.stack().is_empty());
    }

    #[test]
    fn errors() {
        for (input, want) in [
            ("showpage", Error::UnknownOperator("showpage".into())),
            ("pop", Error::StackUnderflow("pop".into())),
            ("1 exch", Error::StackUnderflow("exch".into())),
            (
                "(a) 1 add",
                Error::TypeMismatch {
                    operator: "add".into(),
                    expected: "number",
                },
            ),
            ("(abc", Error::UnterminatedString),
        ] {
            match run(input) {
                Err(crate::Error::PostScript(got)) => assert_eq!(got, want, "input {input}"),
                other => panic!("input {input}: unexpected result {:?}", other.map(|r| r.0)),
            }
        }
    }
}
