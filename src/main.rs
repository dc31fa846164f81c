pub mod error;
pub mod ffmpeg;
pub mod file_task;
pub mod fstools;
pub mod locator;
pub mod outcome;
pub mod pipeline;
pub mod process;
pub mod progress;
pub mod reporter;
pub mod request;

use std::cell::RefCell;
use std::process::ExitCode;

use env_logger::Env;
use log::{error, info};
use rustop::opts;

use ffmpeg::FFmpeg;
use fstools::expand_inputs;
use locator::BinaryLocator;
use outcome::FileResult;
use pipeline::ConversionPipeline;
use process::SystemRunner;
use progress::ProgressUpdate;
use reporter::{format_result, summarize, ProgressReporter};
use request::{ConversionRequest, RunContext};

fn main() -> ExitCode {
    let (args, _rest) = opts! {
        synopsis "Re-encode media files with a two-pass ffmpeg run and keep only the ones that got smaller.";
        opt quiet:bool=false, desc:"Don't show encoding progress.";
        opt no_match_timestamp:bool=false, desc:"Leave the converted file's modification time alone.";
        opt extension:String=String::from("mp4"), desc:"Output extension, which also picks the container.";
        opt improvement:i64=10, desc:"Percent smaller the output must be to keep it. [0-99]";
        opt video_encoder:String=String::from("libx265"), desc:"ffmpeg video encoder.";
        opt video_bitrate:u32=1500, desc:"Video bitrate in kbit/s.";
        opt audio_encoder:String=String::from("aac"), desc:"ffmpeg audio encoder.";
        opt audio_bitrate:u32=128, desc:"Audio bitrate in kbit/s.";
        opt full_paths:bool=false, desc:"Print absolute output paths.";
        opt ffmpeg_dir:String=String::new(), desc:"Directory to look for ffmpeg in first.";
        opt ffprobe_dir:String=String::new(), desc:"Directory to look for ffprobe in first.";
        opt json:bool=false, desc:"Print one JSON record per file.";
        opt verbose:bool=false, desc:"Log every ffmpeg invocation.";
        param inputs:Vec<String>, desc:"Input files or directories";
    }.parse_or_exit();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let context = match RunContext::from_environment() {
        Ok(context) => context,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        },
    };

    let locator = BinaryLocator::new(context.working_dir.clone());
    let tools = match FFmpeg::locate(&locator, &args.ffmpeg_dir, &args.ffprobe_dir) {
        Ok(tools) => tools,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        },
    };

    let request = ConversionRequest {
        video_encoder: args.video_encoder,
        video_bitrate: args.video_bitrate,
        audio_encoder: args.audio_encoder,
        audio_bitrate: args.audio_bitrate,
        match_timestamp: !args.no_match_timestamp,
        full_paths: args.full_paths,
        quiet: args.quiet,
        ..ConversionRequest::default()
    }
    .improvement(args.improvement)
    .extension(&args.extension);

    let inputs = expand_inputs(&args.inputs);
    let reporter = RefCell::new(ProgressReporter::new());
    let pipeline = ConversionPipeline::new(&request, &context, &tools, SystemRunner);
    let results = pipeline.run_batch(
        &inputs,
        &mut |update: &ProgressUpdate| reporter.borrow_mut().update(update),
        &mut |result: &FileResult| {
            reporter.borrow_mut().finish();
            println!("{}", format_result(result, args.json));
        },
    );

    info!("{}", summarize(&results));
    ExitCode::SUCCESS
}
