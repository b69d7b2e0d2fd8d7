use serde::{ Deserialize, Serialize };

/// Jaro-Winkler similarity a transcript needs to reach before it is treated
/// as a mis-heard command phrase.
pub const FUZZY_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceCommand {
    OpenDashboard,
    OpenNavigation,
    OpenChat,
    EmergencyAlert,
    ReadScreen,
    IncreaseTextSize,
    DecreaseTextSize,
    ToggleHighContrast,
    StartDictation,
    StopListening,
}

impl VoiceCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceCommand::OpenDashboard => "open_dashboard",
            VoiceCommand::OpenNavigation => "open_navigation",
            VoiceCommand::OpenChat => "open_chat",
            VoiceCommand::EmergencyAlert => "emergency_alert",
            VoiceCommand::ReadScreen => "read_screen",
            VoiceCommand::IncreaseTextSize => "increase_text_size",
            VoiceCommand::DecreaseTextSize => "decrease_text_size",
            VoiceCommand::ToggleHighContrast => "toggle_high_contrast",
            VoiceCommand::StartDictation => "start_dictation",
            VoiceCommand::StopListening => "stop_listening",
        }
    }
}

/// Phrase table, checked in order. Emergency phrases come first so that
/// "emergency, open navigation" raises the alert.
pub const COMMAND_TABLE: &[(&str, VoiceCommand)] = &[
    ("emergency alert", VoiceCommand::EmergencyAlert),
    ("call for help", VoiceCommand::EmergencyAlert),
    ("emergency", VoiceCommand::EmergencyAlert),
    ("stop listening", VoiceCommand::StopListening),
    ("open dashboard", VoiceCommand::OpenDashboard),
    ("go home", VoiceCommand::OpenDashboard),
    ("open navigation", VoiceCommand::OpenNavigation),
    ("navigate", VoiceCommand::OpenNavigation),
    ("open chat", VoiceCommand::OpenChat),
    ("talk to assistant", VoiceCommand::OpenChat),
    ("read screen", VoiceCommand::ReadScreen),
    ("read this page", VoiceCommand::ReadScreen),
    ("increase text size", VoiceCommand::IncreaseTextSize),
    ("bigger text", VoiceCommand::IncreaseTextSize),
    ("decrease text size", VoiceCommand::DecreaseTextSize),
    ("smaller text", VoiceCommand::DecreaseTextSize),
    ("high contrast", VoiceCommand::ToggleHighContrast),
    ("start dictation", VoiceCommand::StartDictation),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceMatch {
    pub command: VoiceCommand,
    pub phrase: String,
    /// 1.0 for an exact phrase hit, the similarity score for a fuzzy one.
    pub score: f64,
}

fn normalize(transcript: &str) -> String {
    transcript
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .to_lowercase()
}

pub fn match_command(transcript: &str) -> Option<VoiceMatch> {
    let normalized = normalize(transcript);
    if normalized.is_empty() {
        return None;
    }

    if
        let Some((phrase, command)) = COMMAND_TABLE.iter().find(|(phrase, _)|
            normalized.contains(phrase)
        )
    {
        return Some(VoiceMatch {
            command: *command,
            phrase: phrase.to_string(),
            score: 1.0,
        });
    }

    let mut best: Option<&(&str, VoiceCommand)> = None;
    let mut best_score = 0.0;
    for entry in COMMAND_TABLE {
        let score = strsim::jaro_winkler(&normalized, entry.0);
        if score > best_score {
            best_score = score;
            best = Some(entry);
        }
    }

    match best {
        Some((phrase, command)) if best_score >= FUZZY_THRESHOLD =>
            Some(VoiceMatch {
                command: *command,
                phrase: phrase.to_string(),
                score: best_score,
            }),
        _ => None,
    }
}
