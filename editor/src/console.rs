//! Console command registry.
//!
//! Commands are plain functions over the [`EditorModule`], registered by
//! name. A command returns the text to print or a [`ConsoleError`].

use std::collections::BTreeMap;
use std::fmt::Write;

use mentor_core::abstract_editor::EditActionError;
use mentor_core::dump::{dump_object, dump_type};
use mentor_core::reflect::{FieldKind, Value};
use mentor_core::scene::{Object, ObjectId, Scene, SceneError};
use mentor_teach::diff::to_ron;
use mentor_teach::present::{build_diff_tree, render_text};
use mentor_teach::{CaptureError, TransactionHost};
use thiserror::Error;

use crate::actions::{DestroyAction, RetypeAction, SetPropertyAction, SpawnAction};
use crate::module::EditorModule;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("unterminated quote in '{0}'")]
    UnterminatedQuote(String),
    #[error("cannot parse '{text}' as {kind}: {reason}")]
    InvalidValue {
        text: String,
        kind: FieldKind,
        reason: String,
    },
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Action(#[from] EditActionError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("failed to serialize report: {0}")]
    Report(#[from] ron::Error),
}

pub type CommandFn = fn(&mut EditorModule, &[String]) -> Result<String, ConsoleError>;

/// A registered console command.
#[derive(Clone, Copy)]
pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub run: CommandFn,
}

pub struct Console {
    commands: BTreeMap<&'static str, Command>,
}

impl Console {
    /// A console with every built-in command registered.
    pub fn new() -> Self {
        let mut console = Self {
            commands: BTreeMap::new(),
        };
        for command in BUILTIN_COMMANDS {
            console.register(*command);
        }
        console
    }

    pub fn register(&mut self, command: Command) {
        if self.commands.insert(command.name, command).is_some() {
            log::warn!("Console command '{}' replaced", command.name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    /// Parses and runs one command line. Blank lines and `#` comments
    /// produce no output.
    pub fn execute(&self, editor: &mut EditorModule, line: &str) -> Result<String, ConsoleError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(String::new());
        }
        let words = tokenize(line)?;
        let Some((name, args)) = words.split_first() else {
            return Ok(String::new());
        };

        if name == "help" {
            return Ok(self.help());
        }
        let command = self
            .commands
            .get(name.as_str())
            .ok_or_else(|| ConsoleError::UnknownCommand(name.clone()))?;
        log::debug!("Console: {line}");
        (command.run)(editor, args)
    }

    pub fn help(&self) -> String {
        let mut out = String::new();
        for command in self.commands.values() {
            let _ = writeln!(out, "{:<40} {}", command.usage, command.help);
        }
        out
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits on whitespace, keeping double-quoted runs together.
fn tokenize(line: &str) -> Result<Vec<String>, ConsoleError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut has_word = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                has_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if has_word {
                    words.push(std::mem::take(&mut current));
                    has_word = false;
                }
            }
            c => {
                current.push(c);
                has_word = true;
            }
        }
    }
    if quoted {
        return Err(ConsoleError::UnterminatedQuote(line.to_string()));
    }
    if has_word {
        words.push(current);
    }
    Ok(words)
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

fn arg<'a>(args: &'a [String], index: usize, usage: &'static str) -> Result<&'a str, ConsoleError> {
    args.get(index)
        .map(String::as_str)
        .ok_or(ConsoleError::Usage(usage))
}

fn resolve(scene: &Scene, path: &str) -> Result<ObjectId, ConsoleError> {
    scene
        .find_by_path(path)
        .map(Object::id)
        .ok_or_else(|| SceneError::PathNotFound(path.to_string()).into())
}

/// Parses optional `visible` / `modified` switches.
fn dump_switches(args: &[String]) -> (bool, bool) {
    let has = |flag: &str| args.iter().any(|a| a.eq_ignore_ascii_case(flag));
    (has("visible"), has("modified"))
}

/// Parses `text` as a value of the same kind as `current`.
///
/// Scalars and references take plain text; `null` clears a reference.
/// Records, containers and delegates are written in RON.
fn parse_value(scene: &Scene, current: &Value, text: &str) -> Result<Value, ConsoleError> {
    let kind = current.kind();
    let invalid = |reason: String| ConsoleError::InvalidValue {
        text: text.to_string(),
        kind,
        reason,
    };
    let reference = |text: &str| -> Result<Option<ObjectId>, ConsoleError> {
        if text.eq_ignore_ascii_case("null") {
            Ok(None)
        } else {
            resolve(scene, text).map(Some)
        }
    };

    let value = match current {
        Value::Bool(_) => match text {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => return Err(invalid("expected true or false".into())),
        },
        Value::Int(_) => Value::Int(text.parse().map_err(|e| invalid(format!("{e}")))?),
        Value::Float(_) => Value::Float(text.parse().map_err(|e| invalid(format!("{e}")))?),
        Value::String(_) => Value::String(text.to_string()),
        Value::Enum { .. } => {
            let (name, value) = text
                .split_once('=')
                .ok_or_else(|| invalid("expected Name=number".into()))?;
            Value::Enum {
                name: name.to_string(),
                value: value.parse().map_err(|e| invalid(format!("{e}")))?,
            }
        }
        Value::Object(_) => Value::Object(reference(text)?),
        Value::WeakObject(_) => Value::WeakObject(reference(text)?),
        Value::SoftObject(_) if text.eq_ignore_ascii_case("null") => Value::SoftObject(String::new()),
        Value::SoftObject(_) => Value::SoftObject(text.to_string()),
        Value::Other(_) => Value::Other(text.to_string()),
        _ => {
            let parsed: Value = ron::from_str(text).map_err(|e| invalid(e.to_string()))?;
            if parsed.kind() != kind {
                return Err(invalid(format!("got {}", parsed.kind())));
            }
            parsed
        }
    };
    Ok(value)
}

// ---------------------------------------------------------------------------
// Teaching
// ---------------------------------------------------------------------------

fn teach_start(editor: &mut EditorModule, _args: &[String]) -> Result<String, ConsoleError> {
    editor.start_teaching();
    let state = editor.teaching().state();
    Ok(if state.recording {
        match state.baseline {
            Some(baseline) => format!("Teaching session recording from transaction {baseline}"),
            None => "Teaching session recording (no history baseline)".to_string(),
        }
    } else {
        "Teaching session could not start".to_string()
    })
}

fn teach_stop(editor: &mut EditorModule, _args: &[String]) -> Result<String, ConsoleError> {
    match editor.stop_teaching() {
        Ok(summary) => Ok(match summary.range {
            Some((start, end)) => format!(
                "Captured {} transactions from [{start}, {end}]",
                summary.captured
            ),
            None => "No new transactions".to_string(),
        }),
        Err(CaptureError::PartialSuccess { captured, skipped }) => {
            let mut out = format!("Captured {captured} transactions, {} skipped:\n", skipped.len());
            for step in &skipped {
                let _ = writeln!(out, "  transaction {}: {}", step.index, step.reason);
            }
            Ok(out)
        }
        Err(err) => Err(err.into()),
    }
}

fn teach_report(editor: &mut EditorModule, args: &[String]) -> Result<String, ConsoleError> {
    let captured = editor.teaching().captured();
    if args.first().is_some_and(|a| a == "text") {
        return Ok(render_text(&build_diff_tree(captured)));
    }
    Ok(to_ron(captured)?)
}

fn teach_event(editor: &mut EditorModule, args: &[String]) -> Result<String, ConsoleError> {
    let name = arg(args, 0, "teach.event <name> [payload]")?;
    let payload = args[1..].join(" ");
    if !editor.teaching().is_recording() {
        return Ok("Ignored: not recording".to_string());
    }
    editor.teaching_mut().record_custom_event(name, payload);
    Ok(format!("Recorded event '{name}'"))
}

fn teach_status(editor: &mut EditorModule, _args: &[String]) -> Result<String, ConsoleError> {
    let teaching = editor.teaching();
    let state = teaching.state();
    let mut out = if state.recording {
        format!(
            "Recording (baseline {:?}, {} events)\n",
            state.baseline,
            state.events.len()
        )
    } else {
        format!("Idle ({} captured transactions)\n", state.captured.len())
    };
    for description in teaching.filter_chain().descriptions() {
        let _ = writeln!(out, "  filter: {description}");
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

fn obj_list(editor: &mut EditorModule, args: &[String]) -> Result<String, ConsoleError> {
    let prefix = args.first().map(String::as_str).unwrap_or("");
    let scene = editor.scene();
    let transient = scene.transient_package();
    let mut out = String::new();
    for object in scene.objects() {
        if object.is_template()
            || object.id() == transient
            || object.outer() == Some(transient)
            || !object.path().starts_with(prefix)
        {
            continue;
        }
        let _ = writeln!(out, "{} ({})", object.path(), object.class_name());
    }
    Ok(out)
}

fn obj_set(editor: &mut EditorModule, args: &[String]) -> Result<String, ConsoleError> {
    const USAGE: &str = "obj.set <path> <field> <value>";
    let path = arg(args, 0, USAGE)?;
    let field = arg(args, 1, USAGE)?;
    let text = arg(args, 2, USAGE)?;

    let scene = editor.scene();
    let id = resolve(scene, path)?;
    let object = scene.get(id).ok_or(SceneError::ObjectNotFound(id))?;
    let current = object.get(field).ok_or_else(|| SceneError::FieldNotFound {
        type_name: object.class_name().to_string(),
        field: field.to_string(),
    })?;
    let value = parse_value(scene, current, text)?;
    let action = SetPropertyAction::new(scene, id, field, value)?;
    editor.execute(Box::new(action))?;
    Ok(format!("{path}.{field} = {text}"))
}

fn obj_spawn(editor: &mut EditorModule, args: &[String]) -> Result<String, ConsoleError> {
    const USAGE: &str = "obj.spawn <type> <outer path|-> <name>";
    let type_name = arg(args, 0, USAGE)?;
    let outer = arg(args, 1, USAGE)?;
    let name = arg(args, 2, USAGE)?;

    let outer = match outer {
        "-" => None,
        path => Some(resolve(editor.scene(), path)?),
    };
    editor.execute(Box::new(SpawnAction::new(type_name, outer, name)))?;
    Ok(format!("Spawned {type_name} '{name}'"))
}

fn obj_destroy(editor: &mut EditorModule, args: &[String]) -> Result<String, ConsoleError> {
    let path = arg(args, 0, "obj.destroy <path>")?;
    let id = resolve(editor.scene(), path)?;
    editor.execute(Box::new(DestroyAction::new(id)))?;
    Ok(format!("Destroyed {path}"))
}

fn obj_retype(editor: &mut EditorModule, args: &[String]) -> Result<String, ConsoleError> {
    const USAGE: &str = "obj.retype <path> <type>";
    let path = arg(args, 0, USAGE)?;
    let type_name = arg(args, 1, USAGE)?;
    let id = resolve(editor.scene(), path)?;
    editor.execute(Box::new(RetypeAction::new(id, type_name)))?;
    Ok(format!("{path} is now {type_name}"))
}

fn obj_dump(editor: &mut EditorModule, args: &[String]) -> Result<String, ConsoleError> {
    let path = arg(args, 0, "obj.dump <path> [visible] [modified]")?;
    let (visible, modified) = dump_switches(&args[1..]);
    let scene = editor.scene();
    let id = resolve(scene, path)?;
    Ok(dump_object(scene, id, visible, modified)?)
}

fn type_dump(editor: &mut EditorModule, args: &[String]) -> Result<String, ConsoleError> {
    let type_name = arg(args, 0, "type.dump <type> [visible] [modified]")?;
    let (visible, modified) = dump_switches(&args[1..]);
    Ok(dump_type(editor.scene(), type_name, visible, modified)?)
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

fn undo(editor: &mut EditorModule, _args: &[String]) -> Result<String, ConsoleError> {
    editor.undo()?;
    Ok("Undone".to_string())
}

fn redo(editor: &mut EditorModule, _args: &[String]) -> Result<String, ConsoleError> {
    editor.redo()?;
    Ok("Redone".to_string())
}

fn history(editor: &mut EditorModule, _args: &[String]) -> Result<String, ConsoleError> {
    let host = editor.host();
    let applied = host.undo_count();
    let mut out = String::new();
    for index in 0..host.queue_length().unwrap_or(0) {
        let Some(record) = host.transaction(index) else {
            continue;
        };
        if index == applied {
            out.push_str("  -- current --\n");
        }
        let marker = if index < applied { "UNDO" } else { "REDO" };
        let _ = writeln!(out, "{index:>4} {marker} {}", record.title);
    }
    Ok(out)
}

fn gc(editor: &mut EditorModule, _args: &[String]) -> Result<String, ConsoleError> {
    let removed = editor.scene_mut().collect_garbage();
    Ok(format!("Collected {removed} objects"))
}

// ---------------------------------------------------------------------------
// Log capture
// ---------------------------------------------------------------------------

fn log_enable(editor: &mut EditorModule, _args: &[String]) -> Result<String, ConsoleError> {
    editor.log_buffer().lock().enable();
    Ok("Log capture enabled".to_string())
}

fn log_disable(editor: &mut EditorModule, _args: &[String]) -> Result<String, ConsoleError> {
    editor.log_buffer().lock().disable();
    Ok("Log capture disabled".to_string())
}

fn log_print(editor: &mut EditorModule, args: &[String]) -> Result<String, ConsoleError> {
    let mut buffer = editor.log_buffer().lock();
    if !buffer.has_logs() {
        return Ok("No captured logs".to_string());
    }
    let text = buffer.text();
    if args.first().is_some_and(|a| a == "clear") {
        buffer.clear();
    }
    Ok(text)
}

fn log_clear(editor: &mut EditorModule, _args: &[String]) -> Result<String, ConsoleError> {
    editor.log_buffer().lock().clear();
    Ok("Log buffer cleared".to_string())
}

fn log_count(editor: &mut EditorModule, _args: &[String]) -> Result<String, ConsoleError> {
    Ok(editor.log_buffer().lock().count().to_string())
}

const BUILTIN_COMMANDS: &[Command] = &[
    Command {
        name: "teach.start",
        usage: "teach.start",
        help: "Start recording a teaching session",
        run: teach_start,
    },
    Command {
        name: "teach.stop",
        usage: "teach.stop",
        help: "Stop recording and capture the session diff",
        run: teach_stop,
    },
    Command {
        name: "teach.report",
        usage: "teach.report [text]",
        help: "Print the last capture as RON (or as a text tree)",
        run: teach_report,
    },
    Command {
        name: "teach.event",
        usage: "teach.event <name> [payload]",
        help: "Record a custom event in the running session",
        run: teach_event,
    },
    Command {
        name: "teach.status",
        usage: "teach.status",
        help: "Show the session state and active filters",
        run: teach_status,
    },
    Command {
        name: "obj.list",
        usage: "obj.list [path prefix]",
        help: "List objects",
        run: obj_list,
    },
    Command {
        name: "obj.set",
        usage: "obj.set <path> <field> <value>",
        help: "Set a field (undoable)",
        run: obj_set,
    },
    Command {
        name: "obj.spawn",
        usage: "obj.spawn <type> <outer path|-> <name>",
        help: "Spawn an object (undoable)",
        run: obj_spawn,
    },
    Command {
        name: "obj.destroy",
        usage: "obj.destroy <path>",
        help: "Destroy an object and its subobjects (undoable)",
        run: obj_destroy,
    },
    Command {
        name: "obj.retype",
        usage: "obj.retype <path> <type>",
        help: "Change an object's type (undoable)",
        run: obj_retype,
    },
    Command {
        name: "obj.dump",
        usage: "obj.dump <path> [visible] [modified]",
        help: "Dump an object's properties",
        run: obj_dump,
    },
    Command {
        name: "type.dump",
        usage: "type.dump <type> [visible] [modified]",
        help: "Dump a type's default properties",
        run: type_dump,
    },
    Command {
        name: "undo",
        usage: "undo",
        help: "Undo the last transaction",
        run: undo,
    },
    Command {
        name: "redo",
        usage: "redo",
        help: "Redo the last undone transaction",
        run: redo,
    },
    Command {
        name: "history",
        usage: "history",
        help: "List the transaction queue",
        run: history,
    },
    Command {
        name: "gc",
        usage: "gc",
        help: "Collect garbage objects",
        run: gc,
    },
    Command {
        name: "log.enable",
        usage: "log.enable",
        help: "Start capturing log output",
        run: log_enable,
    },
    Command {
        name: "log.disable",
        usage: "log.disable",
        help: "Stop capturing log output",
        run: log_disable,
    },
    Command {
        name: "log.print",
        usage: "log.print [clear]",
        help: "Print captured log output, optionally clearing it",
        run: log_print,
    },
    Command {
        name: "log.clear",
        usage: "log.clear",
        help: "Clear captured log output",
        run: log_clear,
    },
    Command {
        name: "log.count",
        usage: "log.count",
        help: "Number of captured log lines",
        run: log_count,
    },
];
