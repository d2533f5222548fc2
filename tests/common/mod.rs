#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::thread;

use loxwalk::{Lox, Outcome};

/// Write sink that stays readable after being boxed into the interpreter.
#[derive(Clone, Default)]
pub struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session wired to in-memory output and diagnostics.
pub struct Session {
    pub lox: Lox,
    pub out: SharedBuf,
    pub diagnostics: Rc<RefCell<Vec<String>>>,
}

impl Session {
    pub fn new() -> Self {
        let out = SharedBuf::default();
        let diagnostics: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let lox = Lox::with_io(Box::new(out.clone()), Box::new(Rc::clone(&diagnostics)));

        Self {
            lox,
            out,
            diagnostics,
        }
    }

    pub fn output(&self) -> String {
        self.out.contents()
    }

    pub fn diagnostics(&self) -> Vec<String> {
        self.diagnostics.borrow().clone()
    }
}

/// Run a whole program, returning its outcome, printed output and
/// reported diagnostics.
pub fn run(source: &str) -> (Outcome, String, Vec<String>) {
    let mut session = Session::new();
    let outcome = session.lox.run(source);
    (outcome, session.output(), session.diagnostics())
}

/// Run `f` on a thread whose stack fits the deepest allowed call chain,
/// as the binary does.
pub fn on_large_stack<T, F>(f: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    thread::Builder::new()
        .stack_size(256 * 1024 * 1024)
        .spawn(f)
        .expect("failed to spawn test thread")
        .join()
        .expect("test thread panicked")
}

/// Printed output of a program expected to succeed.
pub fn output_of(source: &str) -> String {
    let (outcome, output, diagnostics) = run(source);
    assert_eq!(outcome, Outcome::Success, "diagnostics: {:?}", diagnostics);
    output
}
