use std::ffi::OsString;
use std::path::Path;

use super::containers::Container;
use crate::request::ConversionRequest;

#[cfg(windows)]
const NULL_TARGET: &str = "NUL";
#[cfg(not(windows))]
const NULL_TARGET: &str = "/dev/null";

fn os(s: &str) -> OsString { OsString::from(s) }

/// Container duration only, as a bare number on stdout.
pub fn probe_args(input: &Path) -> Vec<OsString> {
    vec![
        os("-v"), os("error"),
        os("-show_entries"), os("format=duration"),
        os("-of"), os("default=noprint_wrappers=1:nokey=1"),
        input.as_os_str().to_owned(),
    ]
}

/// Statistics-gathering pass: video only, output thrown away.
pub fn pass1_args(request: &ConversionRequest, input: &Path, progress_log: &Path, pass_log_prefix: &Path) -> Vec<OsString> {
    let mut args = common_args(input, progress_log);
    args.append(&mut video_args(request, 1, pass_log_prefix));

    // no audio in the first pass
    args.push(os("-an"));

    args.push(os("-f")); args.push(os("null"));
    args.push(os(NULL_TARGET));
    args
}

/// Final pass: video from the collected statistics plus audio.
pub fn pass2_args(request: &ConversionRequest, input: &Path, output: &Path, progress_log: &Path, pass_log_prefix: &Path) -> Vec<OsString> {
    let mut args = common_args(input, progress_log);
    args.append(&mut video_args(request, 2, pass_log_prefix));

    args.push(os("-c:a")); args.push(os(&request.audio_encoder));
    args.push(os("-b:a")); args.push(os(&format!("{}k", request.audio_bitrate)));

    // explicitly set container format when the extension names a known one
    if let Some(container) = Container::from_extension(&request.extension) {
        args.extend(Container::parameters(container).into_iter().map(OsString::from));
    }

    args.push(output.as_os_str().to_owned());
    args
}

fn common_args(input: &Path, progress_log: &Path) -> Vec<OsString> {
    vec![
        os("-y"),
        os("-nostdin"),
        os("-hide_banner"),
        os("-nostats"),
        os("-loglevel"), os("error"),
        os("-progress"), progress_log.as_os_str().to_owned(),
        os("-i"), input.as_os_str().to_owned(),
    ]
}

fn video_args(request: &ConversionRequest, pass: u8, pass_log_prefix: &Path) -> Vec<OsString> {
    let mut args = vec![
        os("-c:v"), os(&request.video_encoder),
        os("-b:v"), os(&format!("{}k", request.video_bitrate)),
        os("-pass"), os(&pass.to_string()),
        os("-passlogfile"), pass_log_prefix.as_os_str().to_owned(),
    ];

    // x265 logs on its own and ignores -loglevel; any stderr output fails the pass
    if request.video_encoder == "libx265" {
        args.push(os("-x265-params")); args.push(os("log-level=error"));
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    fn value_after(args: &[String], flag: &str) -> Option<String> {
        args.iter().position(|a| a == flag).map(|i| args[i + 1].clone())
    }

    #[test]
    fn test_probe_args() {
        let args = strings(probe_args(Path::new("in.avi")));
        assert_eq!(value_after(&args, "-show_entries").as_deref(), Some("format=duration"));
        assert_eq!(args.last().map(String::as_str), Some("in.avi"));
    }

    #[test]
    fn test_pass1_args() {
        let request = ConversionRequest::default();
        let args = strings(pass1_args(&request, Path::new("in.avi"), Path::new("p1.log"), Path::new("stats")));
        assert_eq!(value_after(&args, "-pass").as_deref(), Some("1"));
        assert_eq!(value_after(&args, "-b:v").as_deref(), Some("1500k"));
        assert_eq!(value_after(&args, "-c:v").as_deref(), Some("libx265"));
        assert_eq!(value_after(&args, "-progress").as_deref(), Some("p1.log"));
        assert_eq!(value_after(&args, "-passlogfile").as_deref(), Some("stats"));
        assert_eq!(value_after(&args, "-f").as_deref(), Some("null"));
        assert!(args.contains(&String::from("-an")));
        assert!(!args.contains(&String::from("-c:a")));
        assert_eq!(args.last().map(String::as_str), Some(NULL_TARGET));
    }

    #[test]
    fn test_pass2_args() {
        let request = ConversionRequest::default().extension("mkv");
        let args = strings(pass2_args(&request, Path::new("in.avi"), Path::new("out.mkv"), Path::new("p2.log"), Path::new("stats")));
        assert_eq!(value_after(&args, "-pass").as_deref(), Some("2"));
        assert_eq!(value_after(&args, "-passlogfile").as_deref(), Some("stats"));
        assert_eq!(value_after(&args, "-c:a").as_deref(), Some("aac"));
        assert_eq!(value_after(&args, "-b:a").as_deref(), Some("128k"));
        assert_eq!(value_after(&args, "-f").as_deref(), Some("matroska"));
        assert!(!args.contains(&String::from("-an")));
        assert_eq!(args.last().map(String::as_str), Some("out.mkv"));
    }

    #[test]
    fn test_pass2_unknown_container_has_no_format_flag() {
        let request = ConversionRequest::default().extension("webm");
        let args = strings(pass2_args(&request, Path::new("in.avi"), Path::new("out.webm"), Path::new("p2.log"), Path::new("stats")));
        assert_eq!(value_after(&args, "-f"), None);
    }

    #[test]
    fn test_x265_is_told_to_log_errors_only() {
        let request = ConversionRequest::default();
        for args in [
            strings(pass1_args(&request, Path::new("in.avi"), Path::new("p1.log"), Path::new("stats"))),
            strings(pass2_args(&request, Path::new("in.avi"), Path::new("out.mp4"), Path::new("p2.log"), Path::new("stats"))),
        ] {
            assert_eq!(value_after(&args, "-x265-params").as_deref(), Some("log-level=error"));
        }

        let request = ConversionRequest { video_encoder: String::from("libx264"), ..ConversionRequest::default() };
        let args = strings(pass1_args(&request, Path::new("in.avi"), Path::new("p1.log"), Path::new("stats")));
        assert_eq!(value_after(&args, "-x265-params"), None);
    }
}
