//! avsprobe CLI
//!
//! A command-line front-end for the avsprobe library: probes a media file
//! and prints one block per discovered elementary stream.

use anyhow::Context;
use avsprobe_lib::format::Container;
use avsprobe_lib::probe::{self, MediaReport, StreamId};
use avsprobe_lib::{AvsInfo, CodecKind};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "avsprobe")]
#[command(about = "AVS-family media metadata analyzer", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe a media file and print stream reports
    Probe {
        /// Input file path
        input: PathBuf,

        /// Force the container kind instead of sniffing it
        #[arg(long)]
        container: Option<ContainerArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ContainerArg {
    Ts,
    Bmff,
    Avs1,
    Avs2,
    Avs3,
    Av3a,
}

impl ContainerArg {
    fn to_container(self) -> Container {
        match self {
            ContainerArg::Ts => Container::MpegTs,
            ContainerArg::Bmff => Container::Bmff,
            ContainerArg::Avs1 => Container::RawEs(CodecKind::Avs1),
            ContainerArg::Avs2 => Container::RawEs(CodecKind::Avs2),
            ContainerArg::Avs3 => Container::RawEs(CodecKind::Avs3Video),
            ContainerArg::Av3a => Container::RawEs(CodecKind::Av3aAudio),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Probe { input, container } => {
            let bytes = std::fs::read(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let report = match container {
                Some(arg) => probe::analyze(&bytes, arg.to_container())?,
                None => probe::analyze_auto(&bytes)?,
            };
            print_report(&report);
        }
    }

    Ok(())
}

fn print_report(report: &MediaReport) {
    for warning in &report.warnings {
        println!("warning: {}", warning);
    }
    if report.streams.is_empty() {
        println!("no streams found");
        return;
    }

    for stream in &report.streams {
        let id = match stream.id {
            StreamId::Pid(pid) => format!("PID 0x{:04X}", pid),
            StreamId::Track(track) => format!("track {}", track),
            StreamId::Raw => "raw".to_string(),
        };
        println!("{} [{}]", id, stream.type_label);
        if let Some(program) = stream.program_number {
            println!("  program: {}", program);
        }
        if let Some(language) = &stream.language {
            println!("  language: {}", language);
        }
        if let Some(registration) = stream.registration_fourcc {
            println!(
                "  registration: {}",
                avsprobe_lib::format::bmff::fourcc_str(&registration)
            );
        }
        if let Some(descriptor) = &stream.descriptor {
            print_descriptor(descriptor);
        }
        match &stream.info {
            Some(AvsInfo::Video(video)) => print_video_info(video),
            Some(AvsInfo::Audio(audio)) => print_audio_info(audio),
            None => {}
        }
    }
}

fn print_descriptor(descriptor: &avsprobe_lib::format::AvsDescriptor) {
    use avsprobe_lib::format::AvsDescriptor;
    match descriptor {
        AvsDescriptor::Video(video) => {
            println!(
                "  descriptor: {} profile {}, level {}, {:.3} fps, {}",
                match video.generation {
                    CodecKind::Avs1 => "AVS",
                    CodecKind::Avs2 => "AVS2",
                    _ => "AVS3",
                },
                video.profile,
                video.level,
                video.frame_rate,
                video.chroma_format.name()
            );
        }
        AvsDescriptor::Audio(audio) => {
            println!(
                "  descriptor: Audio Vivid, {} Hz, {} kbps",
                audio.sampling_frequency,
                audio.total_bitrate / 1000
            );
        }
    }
}

fn print_video_info(video: &avsprobe_lib::AvsVideoInfo) {
    println!(
        "  {} {} @ {}: {}x{}{}, {:.3} fps",
        video.generation,
        video.profile,
        video.level,
        video.width,
        video.height,
        if video.progressive { "p" } else { "i" },
        video.frame_rate
    );
    println!(
        "  chroma {}, depth {}/{}, {} bps{}",
        video.chroma_format.name(),
        video
            .luma_bit_depth
            .map_or("?".to_string(), |d| d.to_string()),
        video
            .chroma_bit_depth
            .map_or("?".to_string(), |d| d.to_string()),
        video.bit_rate,
        if video.low_delay { ", low delay" } else { "" }
    );
    if let Some(sar) = video.sar {
        println!("  SAR {}", sar);
    }
    if let Some(dar) = video.dar {
        println!("  DAR {}", dar);
    }
    if let (Some(width), Some(height)) = (video.display_width, video.display_height) {
        println!("  display {}x{}", width, height);
    }
    if let Some(description) = video.color_description {
        println!("  colour: {}", description.name());
    } else {
        if let Some(primaries) = video.color_primaries {
            println!("  primaries: {}", primaries.name());
        }
        if let Some(transfer) = video.transfer_characteristics {
            println!("  transfer: {}", transfer.name());
        }
        if let Some(matrix) = video.matrix_coefficients {
            println!("  matrix: {}", matrix.name());
        }
    }
    if let Some(hdr) = video.hdr_dynamic_metadata {
        println!("  HDR dynamic metadata: {}", hdr.name());
    }
    if let Some(packing) = video.packing_mode {
        println!("  packing: {}", packing.name());
    }
}

fn print_audio_info(audio: &avsprobe_lib::AvsAudioInfo) {
    println!(
        "  Audio Vivid {} ({}), {} Hz, {}-bit",
        audio.codec_id.name(),
        audio.coding_profile.name(),
        audio.sampling_frequency,
        audio.resolution
    );
    if let Some(config) = audio.channel_configuration {
        println!("  channels: {}", config);
    }
    if let Some(channels) = audio.channel_number {
        println!("  channel count: {}", channels);
    }
    if let Some(objects) = audio.object_channel_number {
        println!("  objects: {}", objects);
    }
    if let Some(order) = audio.hoa_order {
        println!("  HOA order: {}", order);
    }
    if let Some(bit_rate) = audio.bit_rate {
        println!("  bit rate: {} bps", bit_rate);
    }
}
