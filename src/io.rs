// ABOUTME: Host I/O capability consumed by the print and input built-ins

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::rc::Rc;

/// The console surface the interpreter talks to. Production code uses
/// [`StdIo`]; tests install a [`CaptureIo`] instead so programs run without
/// touching the real stdin/stdout.
pub trait HostIo {
    /// Write text without a trailing newline (used for `input` prompts).
    fn write(&mut self, text: &str);

    /// Write one full line of output.
    fn write_line(&mut self, text: &str);

    /// Read one line, with the trailing newline stripped.
    fn read_line(&mut self) -> io::Result<String>;
}

/// Process stdin/stdout.
pub struct StdIo;

impl HostIo for StdIo {
    fn write(&mut self, text: &str) {
        print!("{}", text);
        // Prompts must appear before the read blocks
        let _ = io::stdout().flush();
    }

    fn write_line(&mut self, text: &str) {
        println!("{}", text);
    }

    fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        let read = io::stdin().read_line(&mut line)?;
        if read == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "end of input"));
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }
}

/// In-memory I/O for tests: collects everything written and serves scripted
/// input lines.
#[derive(Default)]
pub struct CaptureIo {
    pub output: String,
    input: VecDeque<String>,
}

impl CaptureIo {
    pub fn new() -> Rc<RefCell<CaptureIo>> {
        Rc::new(RefCell::new(CaptureIo::default()))
    }

    pub fn with_input(lines: &[&str]) -> Rc<RefCell<CaptureIo>> {
        let io = CaptureIo::new();
        io.borrow_mut().input = lines.iter().map(|s| s.to_string()).collect();
        io
    }

    /// Captured output split into lines.
    pub fn lines(&self) -> Vec<&str> {
        self.output.lines().collect()
    }
}

impl HostIo for CaptureIo {
    fn write(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn write_line(&mut self, text: &str) {
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn read_line(&mut self) -> io::Result<String> {
        self.input
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "end of input"))
    }
}
