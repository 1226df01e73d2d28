use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mentor_editor::{Console, EditorConfig, EditorModule, demo, log_capture};

/// Mentor editor host.
#[derive(Parser, Debug)]
#[command(
    name = "mentor-editor",
    about = "Headless editor host for recording teaching sessions",
    long_about = "Runs a scene with an undo history and a console.\n\n\
        Type 'help' for the command list. A typical session:\n\
          teach.start\n\
          obj.set /Game/Maps/Demo.Hero Health 50\n\
          teach.stop\n\
          teach.report",
    version
)]
struct Args {
    /// Editor configuration file.
    #[arg(long, default_value = "editor.toml")]
    config: PathBuf,

    /// Run console commands from a file instead of stdin.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Start with an empty level instead of the demo scene.
    #[arg(long)]
    no_demo_scene: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    // The logger comes up before the config is read, so it uses the defaults.
    let defaults = EditorConfig::default();
    let log = match log_capture::install(defaults.log.capacity, defaults.log.capture_on_start) {
        Ok(log) => log,
        Err(e) => {
            eprintln!("Failed to install logger: {e}");
            return ExitCode::FAILURE;
        }
    };

    let config = EditorConfig::load_or_default(&args.config);
    config.log.apply(&mut log.lock());

    let scene = if args.no_demo_scene {
        demo::empty_scene().map(|(scene, _)| scene)
    } else {
        demo::demo_scene().map(|(scene, _)| scene)
    };
    let scene = match scene {
        Ok(scene) => scene,
        Err(e) => {
            log::error!("Failed to build scene: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut editor = EditorModule::new(scene, &config, log);
    let console = Console::new();

    let result = match &args.script {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(script) => {
                log::info!("Running script {}", path.display());
                run_lines(&console, &mut editor, script.lines().map(str::to_string), false)
            }
            Err(e) => {
                log::error!("Failed to read script {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => {
            let stdin = std::io::stdin();
            let lines = stdin.lock().lines().map_while(Result::ok);
            run_lines(&console, &mut editor, lines, true)
        }
    };

    if result {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Runs every line, printing output and errors. Returns `false` if any
/// command failed.
fn run_lines(
    console: &Console,
    editor: &mut EditorModule,
    lines: impl Iterator<Item = String>,
    interactive: bool,
) -> bool {
    let mut ok = true;
    let mut stdout = std::io::stdout();
    if interactive {
        let _ = write!(stdout, "> ");
        let _ = stdout.flush();
    }
    for line in lines {
        let line = line.trim();
        if line == "quit" || line == "exit" {
            break;
        }
        match console.execute(editor, line) {
            Ok(output) if output.is_empty() => {}
            Ok(output) => {
                let _ = writeln!(stdout, "{}", output.trim_end());
            }
            Err(e) => {
                ok = false;
                let _ = writeln!(stdout, "error: {e}");
            }
        }
        if interactive {
            let _ = write!(stdout, "> ");
            let _ = stdout.flush();
        }
    }
    ok
}
