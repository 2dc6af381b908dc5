use std::{
    net::UdpSocket,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use mapcast_core::{
    config::parse_port, AppConfig, Canvas, FrameClock, ProjectFile, RemoteReceiver, RenderFrame,
    Session,
};
use rosc::{OscMessage, OscPacket, OscType};
use tracing_subscriber::EnvFilter;

fn main() -> mapcast_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            project,
            osc_port,
            frames,
        } => run(config, project, osc_port, frames),
        Commands::Inspect { project } => inspect(&project),
        Commands::Send {
            host,
            port,
            addr,
            args,
        } => send(&host, port, addr, &args),
    }
}

fn run(
    config: Option<PathBuf>,
    project: Option<PathBuf>,
    osc_port: Option<u16>,
    frames: Option<u64>,
) -> mapcast_core::Result<()> {
    let mut config = match config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(port) = osc_port {
        config.remote.port = port;
        config.remote.enabled = true;
        config.validate()?;
    }
    tracing::info!(?config, "starting session");

    let receiver = if config.remote.enabled {
        Some(RemoteReceiver::bind(&config.remote)?)
    } else {
        None
    };
    let mut clock = FrameClock::new(config.frame_rate);
    let mut session = Session::new(config);
    if let Some(path) = project {
        session.open_project(path)?;
    }

    let mut canvas = LogCanvas;
    loop {
        let frame = clock.wait_and_tick();
        if let Some(receiver) = &receiver {
            session.pump_remote(receiver);
        }
        for paint in session.take_rewinds() {
            tracing::info!(paint, "rewind requested");
        }
        session.render_if_dirty(frame, &mut canvas)?;
        if frames.is_some_and(|limit| frame >= limit) {
            break;
        }
    }

    tracing::info!(frames = clock.frames(), "session stopped");
    Ok(())
}

fn inspect(path: &Path) -> mapcast_core::Result<()> {
    let project = ProjectFile::read(path)?;
    println!(
        "{}: version {}, {} paints, {} mappings",
        path.display(),
        project.version,
        project.paints.len(),
        project.mappings.len()
    );
    for paint in &project.paints {
        println!("  paint {:>4}  {}", paint.uid, paint.name);
        for mapping in project.mappings.iter().filter(|m| m.paint == paint.uid) {
            println!(
                "    mapping {:>4}  {} ({}){}",
                mapping.uid,
                mapping.name,
                mapping.output.kind,
                if mapping.visible { "" } else { " hidden" }
            );
        }
    }
    Ok(())
}

fn send(host: &str, port: u16, addr: String, args: &[String]) -> mapcast_core::Result<()> {
    let packet = OscPacket::Message(OscMessage {
        addr,
        args: args.iter().map(|arg| parse_arg(arg)).collect(),
    });
    let bytes = rosc::encoder::encode(&packet)?;
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.send_to(&bytes, (host, port))?;
    tracing::info!(host, port, ?packet, "sent");
    Ok(())
}

/// Integers, then floats, then `T`/`F`; anything else is sent as a string.
fn parse_arg(arg: &str) -> OscType {
    if let Ok(value) = arg.parse::<i32>() {
        OscType::Int(value)
    } else if let Ok(value) = arg.parse::<f32>() {
        OscType::Float(value)
    } else {
        match arg {
            "T" => OscType::Bool(true),
            "F" => OscType::Bool(false),
            _ => OscType::String(arg.to_string()),
        }
    }
}

/// Headless canvas that reports what would be drawn.
struct LogCanvas;

impl Canvas for LogCanvas {
    fn redraw(&mut self, frame: &RenderFrame) -> mapcast_core::Result<()> {
        tracing::info!(
            frame = frame.frame,
            layers = frame.items.len(),
            visible = frame.visible().count(),
            "redraw"
        );
        for item in frame.visible() {
            tracing::debug!(
                mapping = item.mapping,
                paint = item.paint.uid(),
                source = %item.paint.paint_type(),
                shape = %item.output.kind(),
                "layer"
            );
        }
        Ok(())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless projection mapping host", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the mapping session and listen for remote commands.
    Run {
        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Project to open on startup.
        #[arg(short, long)]
        project: Option<PathBuf>,
        /// Remote-control port; enables the receiver.
        #[arg(long, value_parser = parse_port)]
        osc_port: Option<u16>,
        /// Stop after this many frames instead of running forever.
        #[arg(long)]
        frames: Option<u64>,
    },
    /// Print the paints and mappings stored in a project file.
    Inspect {
        project: PathBuf,
    },
    /// Send one remote-control message, e.g. `send /paint/media/rate 1 50.0`.
    Send {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value = "12345", value_parser = parse_port)]
        port: u16,
        addr: String,
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },
}
