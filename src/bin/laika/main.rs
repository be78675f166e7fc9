//! laika - offline renderer for the filter and shaper engines
//!
//! Renders a test tone through one engine and prints level statistics and
//! the strongest spectral peaks. Useful to hear-check a parameter set
//! without a host, or to eyeball aliasing and self-oscillation.
//!
//! ```bash
//! # Self-oscillating diode ladder, no input
//! laika diode --tone 0 --frequency 0.6 --resonance 1.0
//!
//! # Wavefolder harmonics, raw f32 written to disk
//! laika westcoast --mode lockhart --gain 6 --dump folded.f32
//! ```
//!
//! Set `RUST_LOG=debug` to see engine log output.

mod spectrum;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{bail, Result, WrapErr};
use laika_dsp::{
    config::{DiodeVcfConfig, FilterTap, Ms20Config, WestcoastConfig, WestcoastMode},
    graph::{
        DiodeVcfNode, DiodeVcfParam, GraphNode, Modulatable, Ms20Node, Ms20Param, RenderCtx,
        WestcoastNode, WestcoastParam,
    },
    MAX_BLOCK_SIZE,
};
use spectrum::SpectrumAnalyzer;
use std::{f32::consts::TAU, fs, path::PathBuf};

#[derive(Parser)]
#[command(name = "laika")]
#[command(about = "Render a test tone through a filter or shaper engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    engine: Engine,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Args)]
struct RenderArgs {
    /// Sample rate in Hz
    #[arg(long, default_value = "48000", global = true)]
    sample_rate: f32,

    /// Test tone frequency in Hz (0 = silence)
    #[arg(long, default_value = "110", global = true)]
    tone: f32,

    /// Test tone waveform
    #[arg(long, value_enum, default_value = "saw", global = true)]
    waveform: Waveform,

    /// Test tone amplitude
    #[arg(long, default_value = "0.5", global = true)]
    amplitude: f32,

    /// Length of the render in seconds
    #[arg(long, default_value = "1.0", global = true)]
    seconds: f32,

    /// Samples per render call
    #[arg(long, default_value = "256", global = true)]
    block: usize,

    /// Number of spectral peaks to report
    #[arg(long, default_value = "8", global = true)]
    peaks: usize,

    /// Write the output as raw little-endian f32
    #[arg(long, global = true)]
    dump: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Engine {
    /// Diode-ladder lowpass / highpass
    Diode {
        /// Cutoff knob, 0..1
        #[arg(long, default_value = "0.5")]
        frequency: f32,

        /// Resonance knob, 0..1
        #[arg(long, default_value = "0.0")]
        resonance: f32,

        /// Saturation knob, 0..1
        #[arg(long, default_value = "0.0")]
        saturation: f32,

        /// Run the loop 2x oversampled
        #[arg(long)]
        hidef: bool,

        /// Use the highpass output
        #[arg(long)]
        highpass: bool,
    },

    /// MS-20 style two-pole lowpass / highpass
    Ms20 {
        /// Cutoff knob, 0..1
        #[arg(long, default_value = "0.5")]
        frequency: f32,

        /// Peak (resonance) knob, 0..1
        #[arg(long, default_value = "0.0")]
        peak: f32,

        /// Drive knob, 0..1
        #[arg(long, default_value = "0.0")]
        drive: f32,

        /// Use the highpass output
        #[arg(long)]
        highpass: bool,
    },

    /// Complex shaper: wavefolders and static curves
    Westcoast {
        /// Shaping stage, by name or selector position 1..7
        #[arg(long, default_value = "lockhart")]
        mode: WestcoastMode,

        /// Input gain, 0..20
        #[arg(long, default_value = "1.0")]
        gain: f32,

        /// Input offset, -6..6
        #[arg(long, default_value = "0.0")]
        bias: f32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Waveform {
    Sine,
    Saw,
    Square,
}

fn tap(highpass: bool) -> FilterTap {
    if highpass {
        FilterTap::Highpass
    } else {
        FilterTap::Lowpass
    }
}

fn build_node(engine: &Engine, sample_rate: f32) -> Result<Box<dyn GraphNode>> {
    let node: Box<dyn GraphNode> = match *engine {
        Engine::Diode {
            frequency,
            resonance,
            saturation,
            hidef,
            highpass,
        } => {
            let config = DiodeVcfConfig {
                hidef,
                tap: tap(highpass),
            };
            let mut node = DiodeVcfNode::new(sample_rate, config)?;
            node.apply_modulation(DiodeVcfParam::Frequency, frequency, 0.0);
            node.apply_modulation(DiodeVcfParam::Resonance, resonance, 0.0);
            node.apply_modulation(DiodeVcfParam::Saturation, saturation, 0.0);
            log::info!("diode ladder, {:?}", config);
            Box::new(node)
        }
        Engine::Ms20 {
            frequency,
            peak,
            drive,
            highpass,
        } => {
            let config = Ms20Config {
                tap: tap(highpass),
            };
            let mut node = Ms20Node::new(sample_rate, config)?;
            node.apply_modulation(Ms20Param::Frequency, frequency, 0.0);
            node.apply_modulation(Ms20Param::Peak, peak, 0.0);
            node.apply_modulation(Ms20Param::Drive, drive, 0.0);
            log::info!("ms20, {:?}", config);
            Box::new(node)
        }
        Engine::Westcoast { mode, gain, bias } => {
            let mut node = WestcoastNode::new(sample_rate, WestcoastConfig { mode })?;
            node.apply_modulation(WestcoastParam::Gain, gain, 0.0);
            node.apply_modulation(WestcoastParam::Bias, bias, 0.0);
            log::info!("westcoast, mode {}", mode);
            Box::new(node)
        }
    };
    Ok(node)
}

/// Naive (non band-limited) test tone.
fn tone(args: &RenderArgs, len: usize) -> Vec<f32> {
    let increment = args.tone / args.sample_rate;
    let mut phase = 0.0f32;
    (0..len)
        .map(|_| {
            let y = match args.waveform {
                Waveform::Sine => (TAU * phase).sin(),
                Waveform::Saw => 2.0 * phase - 1.0,
                Waveform::Square => {
                    if phase < 0.5 {
                        1.0
                    } else {
                        -1.0
                    }
                }
            };
            phase = (phase + increment).fract();
            args.amplitude * y
        })
        .collect()
}

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let args = &cli.render;

    if args.block == 0 || args.block > MAX_BLOCK_SIZE {
        bail!("block size must be in 1..={}", MAX_BLOCK_SIZE);
    }
    if !(args.seconds > 0.0) {
        bail!("render length must be positive");
    }

    let mut node = build_node(&cli.engine, args.sample_rate)
        .wrap_err("could not build the engine")?;
    let ctx = RenderCtx::new(args.sample_rate);

    let len = (args.seconds * args.sample_rate) as usize;
    let mut buffer = tone(args, len);
    for block in buffer.chunks_mut(args.block) {
        node.render_block(block, &ctx);
    }
    log::info!("rendered {} samples in blocks of {}", len, args.block);

    let peak = buffer.iter().fold(0.0f32, |acc, x| acc.max(x.abs()));
    let rms = (buffer.iter().map(|x| x * x).sum::<f32>() / len.max(1) as f32).sqrt();
    let dc = buffer.iter().sum::<f32>() / len.max(1) as f32;
    if buffer.iter().any(|x| !x.is_finite()) {
        log::error!("output contains non-finite samples");
    }

    println!("peak  {:8.4}  ({:6.1} dBFS)", peak, 20.0 * peak.max(1e-9).log10());
    println!("rms   {:8.4}  ({:6.1} dBFS)", rms, 20.0 * rms.max(1e-9).log10());
    println!("dc    {:8.4}", dc);

    let fft_len = len.min(1 << 15).next_power_of_two().min(1 << 15);
    let mut analyzer = SpectrumAnalyzer::new(fft_len, args.sample_rate);
    analyzer.analyze(&buffer);
    println!("\n{:>10}  {:>8}", "Hz", "dBFS");
    for p in analyzer.peaks(args.peaks) {
        println!("{:>10.1}  {:>8.1}", p.frequency_hz, p.magnitude_db);
    }

    if let Some(path) = &args.dump {
        let bytes: Vec<u8> = buffer.iter().flat_map(|x| x.to_le_bytes()).collect();
        fs::write(path, bytes).wrap_err_with(|| format!("writing {}", path.display()))?;
        log::info!("wrote {}", path.display());
    }

    Ok(())
}
