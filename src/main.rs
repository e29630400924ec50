use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::process::exit;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use meetrec::{App, AudioDevice, Cli, Commands, Config, DeviceClass, OutputFormat, Recording};

/// Conventional exit code for SIGINT during the record wait-loop.
const EXIT_INTERRUPTED: i32 = 130;

fn main() {
    let cli = Cli::parse();

    let max_level = if cli.quiet {
        tracing::Level::ERROR
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let config = Config::load(cli.config.as_deref())?;
    let mut app = App::new(config)?;

    match cli.command {
        Commands::Devices { format } => {
            let devices = app.devices(false)?;
            print_devices(&devices, format)?;
            Ok(0)
        }
        Commands::Record {
            device,
            duration,
            auto_transcribe,
        } => run_record(&mut app, device, duration, auto_transcribe),
        Commands::List { format, limit } => {
            let mut recordings = app.recordings()?;
            if let Some(limit) = limit {
                recordings.truncate(limit);
            }
            print_recordings(&recordings, format)?;
            Ok(0)
        }
        Commands::Transcribe { file } => {
            anyhow::ensure!(file.exists(), "File not found: {}", file.display());
            let transcript = app.transcribe(&file)?;
            println!("Transcript saved: {}", transcript.display());
            Ok(0)
        }
        Commands::Show { file, lines } => {
            let body = app.transcript_body(&file)?;
            for line in body.lines().take(lines.unwrap_or(usize::MAX)) {
                println!("{}", line);
            }
            Ok(0)
        }
    }
}

fn run_record(
    app: &mut App,
    device: Option<usize>,
    duration: Option<u64>,
    auto_transcribe: bool,
) -> Result<i32> {
    let selected = match device {
        Some(id) => app.set_device(id)?,
        None => app.use_default_device()?,
    };
    info!("using device: {}", selected.name);
    if selected.needs_setup {
        warn!(
            "device '{}' needs setup: loopback driver not installed",
            selected.name
        );
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&interrupted);
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .context("Failed to install interrupt handler")?;
    }

    let filename = app.start_recording()?;
    match duration {
        Some(secs) => info!("recording {} for {}s (Ctrl+C to stop early)", filename, secs),
        None => info!("recording {} (Ctrl+C to stop)", filename),
    }

    let started = Instant::now();
    loop {
        if interrupted.load(Ordering::SeqCst) {
            info!("interrupted, stopping");
            break;
        }
        if let Some(secs) = duration {
            if started.elapsed() >= Duration::from_secs(secs) {
                break;
            }
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    let was_interrupted = interrupted.load(Ordering::SeqCst);

    let path = match app.stop_recording() {
        Ok(path) => {
            println!("Recording saved: {}", path.display());
            Some(path)
        }
        Err(e) => {
            error!("failed to save recording: {:#}", e);
            None
        }
    };

    let mut code = match (&path, was_interrupted) {
        (_, true) => EXIT_INTERRUPTED,
        (Some(_), false) => 0,
        (None, false) => 1,
    };

    if auto_transcribe {
        if let Some(path) = &path {
            match app.transcribe(path) {
                Ok(transcript) => println!("Transcript saved: {}", transcript.display()),
                Err(e) => {
                    error!("transcription failed: {:#}", e);
                    if code == 0 {
                        code = 1;
                    }
                }
            }
        }
    }

    Ok(code)
}

fn print_devices(devices: &[AudioDevice], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(devices)?);
        }
        OutputFormat::Tsv => {
            println!("ID\tNAME\tCLASS\tCHANNELS\tDEFAULT\tNEEDS_SETUP");
            for d in devices {
                println!(
                    "{}\t{}\t{:?}\t{}\t{}\t{}",
                    d.id, d.name, d.class, d.channels_in, d.is_default, d.needs_setup
                );
            }
        }
        OutputFormat::Human => {
            println!("Available audio devices:");
            for d in devices {
                let class_marker = if d.class != DeviceClass::PhysicalInput {
                    format!(" [{:?}]", d.class)
                } else {
                    String::new()
                };
                let setup_marker = if d.needs_setup { " (needs setup)" } else { "" };
                let default_marker = if d.is_default { " [DEFAULT]" } else { "" };
                println!(
                    "{}: {} ({}ch){}{}{}",
                    d.id, d.name, d.channels_in, class_marker, setup_marker, default_marker
                );
            }
        }
    }
    Ok(())
}

fn print_recordings(recordings: &[Recording], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(recordings)?);
        }
        OutputFormat::Tsv => {
            println!("FILENAME\tPATH\tMODIFIED\tDURATION\tSOURCE\tTRANSCRIPT");
            for r in recordings {
                println!(
                    "{}\t{}\t{}\t{:.1}\t{}\t{}",
                    r.filename,
                    r.path.display(),
                    r.modified.to_rfc3339(),
                    r.duration_secs,
                    r.source.label(),
                    r.has_transcript
                );
            }
        }
        OutputFormat::Human => {
            if recordings.is_empty() {
                println!("No recordings found.");
                return Ok(());
            }
            println!("Recordings:");
            for r in recordings {
                let minutes = (r.duration_secs / 60.0) as u64;
                let seconds = (r.duration_secs % 60.0) as u64;
                let transcript_marker = if r.has_transcript { "✓" } else { " " };
                println!(
                    "[{}] {} ({}:{:02}) - {} - {}",
                    transcript_marker,
                    r.filename,
                    minutes,
                    seconds,
                    r.modified.format("%Y-%m-%d %H:%M"),
                    r.source.label()
                );
            }
        }
    }
    Ok(())
}
