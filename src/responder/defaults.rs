use super::{ FallbackRule, IntentRule };

/// The canonical rule table shipped with the assistant.
///
/// Order matters: emergencies are checked before anything else, and the broad
/// `help` rule sits last so that "help with my posture" still reaches
/// ergonomics.
pub fn default_rule_set() -> (Vec<IntentRule>, FallbackRule) {
    let rules = vec![
        IntentRule::new(
            "emergency",
            &[
                "emergency",
                "urgent",
                "danger",
                "sos",
                "911",
                "evacuat",
                "fire alarm",
                "injured",
                "i fell",
                "medical",
            ],
            "🚨 If you are in immediate danger, call emergency services now.\n\n\
             • Press the red Emergency button to alert your safety team and share your location\n\
             • Your nearest accessible evacuation route is shown in the Navigation panel\n\
             • Designated evacuation assistants on your floor have been notified",
            &["Alert safety team", "Show evacuation route", "Call emergency contact"]
        ),
        IntentRule::new(
            "navigation",
            &[
                "restroom",
                "bathroom",
                "toilet",
                "washroom",
                "navigat",
                "direction",
                "where is",
                "where's",
                "elevator",
                "accessible entrance",
                "ramp",
                "parking",
                "exit",
                "floor plan",
                "route",
            ],
            "🗺️ I can guide you around the building.\n\n\
             • Accessible restrooms are next to the elevators on every floor\n\
             • Step-free entrances are on the north and east sides\n\
             • Open the Navigation helper for turn-by-turn, step-free directions",
            &["Nearest accessible restroom", "Step-free route to my desk", "Elevator status"]
        ),
        IntentRule::new(
            "voice_commands",
            &["voice", "speak", "speech", "dictat", "say a command", "hands-free", "hands free"],
            "🎙️ Voice control lets you use the workspace hands-free.\n\n\
             Try saying:\n\
             • \"Open navigation\"\n\
             • \"Read screen\"\n\
             • \"Increase text size\"\n\
             • \"Emergency alert\"",
            &["List all voice commands", "Start dictation", "Voice settings"]
        ),
        IntentRule::new(
            "ergonomics",
            &[
                "posture",
                "ergonom",
                "back pain",
                "neck pain",
                "my desk",
                "desk setup",
                "desk height",
                "standing desk",
                "chair",
                "stretch",
                "wrist",
            ],
            "🪑 Here are some quick ergonomics tips:\n\n\
             • Keep the top of your screen at or slightly below eye level\n\
             • Feet flat, knees at roughly 90 degrees\n\
             • Stand up and stretch for two minutes every half hour\n\
             The Ergonomics coach can track your posture score through the day.",
            &["Start a stretch break", "Check my posture score", "Request an ergonomic assessment"]
        ),
        IntentRule::new(
            "wellbeing",
            &[
                "stress",
                "anxious",
                "anxiety",
                "overwhelm",
                "burnout",
                "take a break",
                "mental health",
                "wellbeing",
                "well-being",
                "tired",
            ],
            "💙 It sounds like you could use a moment for yourself.\n\n\
             • Try a two-minute guided breathing exercise\n\
             • The quiet room on floor 2 is available to book\n\
             • Confidential support is available through the employee assistance programme",
            &["Start breathing exercise", "Book the quiet room", "Talk to someone"]
        ),
        IntentRule::new(
            "buddy",
            &["buddy", "mentor", "peer support", "accessibility partner"],
            "🤝 The buddy programme pairs you with a colleague who can help with day-to-day tasks, \
             from finding meeting rooms to reading printed material.",
            &["Request a buddy", "View my buddy requests", "Become a buddy"]
        ),
        IntentRule::new(
            "translation",
            &["translat", "sign language", "caption", "interpreter", "subtitle"],
            "🌐 I can help with communication support.\n\n\
             • Live captions can be switched on for any meeting\n\
             • Sign language interpreters can be booked with 48 hours notice\n\
             • The Translator tool converts text between 20+ languages",
            &["Open translator", "Book an interpreter", "Turn on live captions"]
        ),
        IntentRule::new(
            "meetings",
            &["meeting", "schedule", "calendar", "appointment"],
            "📅 I can help you schedule an accessible meeting. Tell me the attendees and I will \
             check room accessibility, captioning and interpreter availability.",
            &["Schedule a meeting", "Find an accessible room", "My upcoming meetings"]
        ),
        IntentRule::new(
            "accommodations",
            &["accommodation", "adjustment", "assistive", "adaptive equipment"],
            "📝 Workplace accommodations are handled confidentially by the accessibility team. \
             You can submit a request for equipment, schedule changes or workspace adjustments \
             and track its progress from the dashboard.",
            &["Submit a request", "Track my requests", "What can I ask for?"]
        ),
        IntentRule::new(
            "visual_access",
            &[
                "screen reader",
                "contrast",
                "font size",
                "text size",
                "magnif",
                "zoom",
                "color blind",
                "colour blind",
                "dyslexi",
            ],
            "👓 Display settings can be adjusted at any time:\n\n\
             • High-contrast mode and colour-blind palettes\n\
             • Text size up to 200%\n\
             • Screen reader compatible layout",
            &["Turn on high contrast", "Increase text size", "Read this page aloud"]
        ),
        IntentRule::new(
            "greeting",
            &[
                "hello",
                "hey there",
                "good morning",
                "good afternoon",
                "good evening",
                "greetings",
            ],
            "👋 Hello! I'm your accessibility assistant. How can I help you today?",
            &["Find accessible restroom", "Voice commands", "Ergonomics tips"]
        ),
        IntentRule::new(
            "gratitude",
            &["thank", "thx", "appreciate", "cheers"],
            "You're welcome! Let me know if there is anything else I can do.",
            &[]
        ),
        IntentRule::new(
            "help",
            &["help", "what can you do", "how does this work", "features", "assist"],
            "I can help with:\n\n\
             • Emergency assistance and evacuation routes\n\
             • Accessible navigation around the building\n\
             • Voice commands and display settings\n\
             • Ergonomics, wellbeing and the buddy programme\n\
             • Meetings, captions and translation",
            &["Emergency help", "Find accessible restroom", "Voice commands", "Ergonomics tips"]
        )
    ];

    let fallback = FallbackRule {
        response: "I'm not sure I understood that. I can help with navigation, emergencies, \
                   voice commands, ergonomics and more. Try one of the options below."
            .to_string(),
        suggestions: vec![
            "Find accessible restroom".to_string(),
            "Emergency help".to_string(),
            "Voice commands".to_string(),
            "Ergonomics tips".to_string()
        ],
    };

    (rules, fallback)
}
