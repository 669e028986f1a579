use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use fixture_tester::config::{Config, ConfigLoader};
use fixture_tester::flash::{FlashError, FlashOutput};
use fixture_tester::port::{list_ports, SyncSerialPort};
use fixture_tester::{logging, AppError, AppResult, Report, Sequencer, TestContext};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Check rails, ground and handshake lines of a serial test fixture.",
    long_about = "Talks to a probe microcontroller on one serial port and toggles/samples the control lines of a USB-serial bridge on another, reporting each check in green or red."
)]
struct Cli {
    /// Configuration file (default: resolved from env, cwd, user config dir).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Loopback test, then the full pin battery.
    #[command(name = "alltests")]
    AllTests {
        arduino_port: String,
        ft4232_port: String,
    },

    /// Pin battery only.
    #[command(name = "pintest")]
    PinTest {
        arduino_port: String,
        ft4232_port: String,
    },

    /// Loopback stress test only (TX bridged to RX).
    #[command(name = "loopback")]
    Loopback { ft4232_port: String },

    /// Compile and upload the probe firmware.
    #[command(name = "flash")]
    Flash {
        arduino_port: String,

        /// Only compile, do not upload.
        #[arg(long)]
        verify_only: bool,
    },

    /// List serial ports on this machine.
    #[command(name = "ports")]
    Ports,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match cli.config {
        Some(ref path) => ConfigLoader::load_from(path),
        None => ConfigLoader::load(),
    };
    let config = match loaded {
        Ok(loader) => loader.into_config(),
        Err(e) => {
            eprintln!("{}", format!("Configuration error: {e}").red());
            return ExitCode::from(2);
        }
    };

    logging::init(&config.logging, cli.verbose);
    debug!(?cli, "starting");

    match run(cli.command, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            if let AppError::Flash(FlashError::ToolFailed(ref output)) = e {
                print_tool_output(output);
            }
            eprintln!("{}", e.to_string().red());
            ExitCode::from(e.exit_code())
        }
    }
}

/// Returns whether everything passed.
fn run(command: Command, config: &Config) -> AppResult<bool> {
    match command {
        Command::AllTests {
            arduino_port,
            ft4232_port,
        } => {
            let mut ctx = open_fixture(&arduino_port, &ft4232_port, config)?;
            let report = sequencer(config).run_all(&mut ctx)?;
            Ok(finish(&report))
        }
        Command::PinTest {
            arduino_port,
            ft4232_port,
        } => {
            let mut ctx = open_fixture(&arduino_port, &ft4232_port, config)?;
            let report = sequencer(config).run_pin_battery(&mut ctx)?;
            Ok(finish(&report))
        }
        Command::Loopback { ft4232_port } => {
            let mut bridge = open_port("bridge", &ft4232_port, config)?;
            let report = sequencer(config).run_loopback(&mut bridge)?;
            Ok(finish(&report))
        }
        Command::Flash {
            arduino_port,
            verify_only,
        } => {
            let flasher = config.flash.flasher();
            let output = if verify_only {
                flasher.verify()?
            } else {
                flasher.upload(&config.serial.resolve_port(&arduino_port))?
            };
            print_tool_output(&output);
            println!("{}", "Firmware OK".green());
            Ok(true)
        }
        Command::Ports => {
            let ports = list_ports()?;
            if ports.is_empty() {
                println!("No serial ports found");
            }
            for port in ports {
                match port.product {
                    Some(product) => println!("{}\t{}\t{}", port.name, port.kind, product),
                    None => println!("{}\t{}", port.name, port.kind),
                }
            }
            Ok(true)
        }
    }
}

fn sequencer(config: &Config) -> Sequencer {
    Sequencer::new(config.sequencer.settings()).printing(true)
}

fn open_port(role: &'static str, name: &str, config: &Config) -> AppResult<SyncSerialPort> {
    let port = config.serial.resolve_port(name);
    SyncSerialPort::open(&port, config.serial.port_configuration())
        .map_err(|source| AppError::Open { role, port, source })
}

/// Open the bridge, then the probe, and wait for the probe to boot.
fn open_fixture(
    arduino_port: &str,
    ft4232_port: &str,
    config: &Config,
) -> AppResult<TestContext<SyncSerialPort, SyncSerialPort>> {
    let bridge = open_port("bridge", ft4232_port, config)?;
    let probe = open_port("probe", arduino_port, config)?;
    let mut ctx = TestContext::new(probe, bridge);

    println!("Waiting for arduino...");
    ctx.probe.wait_ready(config.probe.startup_delay())?;
    Ok(ctx)
}

fn finish(report: &Report) -> bool {
    let failed = report.failures().count();
    info!(checks = report.results().len(), failed, "run complete");
    failed == 0
}

fn print_tool_output(output: &FlashOutput) {
    if !output.stdout.is_empty() {
        print!("{}", output.stdout);
    }
    if !output.stderr.is_empty() {
        eprint!("{}", output.stderr);
    }
}
