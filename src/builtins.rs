//! Host built-in functions installed into the global environment.
//!
//! - `print`: write arguments to stdout, space separated, newline terminated
//! - `input`: write an optional prompt, read one line from stdin
//! - `len`: length of the string form of the argument
//! - `int`: truncate a number (or numeric string) toward zero
//! - `str`: canonical string form of the argument
//!
//! Built-ins are ordinary first-class values; programs may shadow them,
//! reassign them, or pass them around like user functions.

use crate::env::Environment;
use crate::error::{KuzurError, ARITY_ONE, ARITY_ZERO_OR_ONE};
use crate::io::{HostIo, StdIo};
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

// ============================================================================
// Host I/O Storage for the print/input Built-in Functions
// ============================================================================

thread_local! {
    static HOST_IO: RefCell<Option<Rc<RefCell<dyn HostIo>>>> = const { RefCell::new(None) };
}

/// Route `print`/`input` through a different I/O capability. Tests use this
/// to capture output and script input; when nothing is installed the
/// built-ins talk to the process stdio.
pub fn set_host_io(io: Rc<RefCell<dyn HostIo>>) {
    HOST_IO.with(|slot| {
        *slot.borrow_mut() = Some(io);
    });
}

fn with_io<R>(f: impl FnOnce(&mut dyn HostIo) -> R) -> R {
    HOST_IO.with(|slot| match slot.borrow().as_ref() {
        Some(io) => f(&mut *io.borrow_mut()),
        None => f(&mut StdIo),
    })
}

// ============================================================================
// Built-in Functions
// ============================================================================

/// Writes its arguments separated by single spaces, followed by a newline.
/// Returns null.
pub fn builtin_print(args: &[Value]) -> Result<Value, KuzurError> {
    let line = args
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    with_io(|io| io.write_line(&line));
    Ok(Value::Null)
}

/// Writes the optional prompt (no trailing newline), reads one line, and
/// returns it as a string with the newline stripped.
pub fn builtin_input(args: &[Value]) -> Result<Value, KuzurError> {
    if args.len() > 1 {
        return Err(KuzurError::arity("input", ARITY_ZERO_OR_ONE, args.len()));
    }

    let line = with_io(|io| {
        if let Some(prompt) = args.first() {
            io.write(&prompt.to_string());
        }
        io.read_line()
    })
    .map_err(|e| KuzurError::runtime(format!("input: {}", e)))?;

    Ok(Value::Str(line))
}

/// Returns the length of the string form of its argument.
pub fn builtin_len(args: &[Value]) -> Result<Value, KuzurError> {
    if args.len() != 1 {
        return Err(KuzurError::arity("len", ARITY_ONE, args.len()));
    }

    Ok(Value::Int(args[0].to_string().chars().count() as i64))
}

/// Parses the argument as a number and truncates it toward zero.
pub fn builtin_int(args: &[Value]) -> Result<Value, KuzurError> {
    if args.len() != 1 {
        return Err(KuzurError::arity("int", ARITY_ONE, args.len()));
    }

    let n = match &args[0] {
        Value::Int(i) => return Ok(Value::Int(*i)),
        Value::Float(f) => *f,
        Value::Bool(b) => return Ok(Value::Int(if *b { 1 } else { 0 })),
        Value::Str(s) => s.trim().parse::<f64>().map_err(|_| {
            KuzurError::type_error(format!("int: cannot convert '{}' to a number", s))
        })?,
        other => {
            return Err(KuzurError::type_error(format!(
                "int: cannot convert {} to a number",
                other.type_name()
            )));
        }
    };

    Ok(Value::Int(n.trunc() as i64))
}

/// Returns the canonical string form of the argument.
pub fn builtin_str(args: &[Value]) -> Result<Value, KuzurError> {
    if args.len() != 1 {
        return Err(KuzurError::arity("str", ARITY_ONE, args.len()));
    }

    Ok(Value::Str(args[0].to_string()))
}

/// Install the built-in functions into the global environment. Runs before
/// any user code.
pub fn register_builtins(env: Rc<Environment>) {
    env.define("print".to_string(), Value::BuiltIn(builtin_print));
    env.define("input".to_string(), Value::BuiltIn(builtin_input));
    env.define("len".to_string(), Value::BuiltIn(builtin_len));
    env.define("int".to_string(), Value::BuiltIn(builtin_int));
    env.define("str".to_string(), Value::BuiltIn(builtin_str));
}
