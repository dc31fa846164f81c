use std::fmt::Display;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Container {
    Matroska,
    MP4,
    QuickTime,
}

impl Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Container::Matroska => write!(f, "matroska"),
            Container::MP4 => write!(f, "mp4"),
            Container::QuickTime => write!(f, "mov"),
        }
    }
}

impl Container {
    /// `None` for extensions the encoder is left to infer on its own.
    pub fn from_extension(extension: &str) -> Option<Container> {
        match extension.to_lowercase().as_str() {
            "mkv" => Some(Container::Matroska),
            "mp4" | "m4v" => Some(Container::MP4),
            "mov" => Some(Container::QuickTime),
            _ => None,
        }
    }

    pub fn parameters(container: Container) -> Vec<String> {
        match container {
            Container::Matroska => vec![
                String::from("-f"),
                container.to_string(),
            ],
            Container::QuickTime | Container::MP4 => vec![
                String::from("-movflags"),
                String::from("+faststart"),
                String::from("-f"),
                container.to_string(),
            ],
        }
    }
}
