//! The 20-question somatic pattern questionnaire
//!
//! Static, versioned configuration data: each option carries a fixed scoring
//! vector over the four patterns (integers, can be negative). Regulated
//! answers subtract a point from every pattern; pattern-specific answers add
//! up to three points to theirs.

use super::AnswerLabel;
use crate::types::PerPattern;

/// Number of questions in the assessment.
pub const QUESTION_COUNT: usize = 20;

/// One selectable option with its per-pattern scoring vector.
#[derive(Debug, Clone, Copy)]
pub struct AnswerOption {
    pub label: AnswerLabel,
    pub text: &'static str,
    pub scoring: PerPattern<i32>,
}

/// One question with 3-4 labeled options.
#[derive(Debug, Clone, Copy)]
pub struct Question {
    pub id: u8,
    pub prompt: &'static str,
    pub options: &'static [AnswerOption],
}

const fn score(
    upper_compression: i32,
    lower_compression: i32,
    thoracic_collapse: i32,
    lateral_asymmetry: i32,
) -> PerPattern<i32> {
    PerPattern {
        upper_compression,
        lower_compression,
        thoracic_collapse,
        lateral_asymmetry,
    }
}

const fn option(label: AnswerLabel, text: &'static str, scoring: PerPattern<i32>) -> AnswerOption {
    AnswerOption {
        label,
        text,
        scoring,
    }
}

use self::AnswerLabel::{A, B, C, D};

/// The full question table, in presentation order.
pub static QUESTIONNAIRE: [Question; QUESTION_COUNT] = [
    Question {
        id: 1,
        prompt: "When unexpected stress hits, your body's first reaction is:",
        options: &[
            option(
                A,
                "Lock up — Jaw clenches, shoulders rise, breath stops",
                score(3, 0, 0, 0),
            ),
            option(
                B,
                "Push through — Adrenaline kicks in, you go into action mode",
                score(1, 2, 0, 0),
            ),
            option(
                C,
                "Shut down — Energy drops, you go blank or numb",
                score(0, 0, 3, 0),
            ),
            option(
                D,
                "Oscillate — Ping-pong between wired and exhausted",
                score(1, 1, 1, 1),
            ),
        ],
    },
    Question {
        id: 2,
        prompt: "After a stressful day, you typically:",
        options: &[
            option(
                A,
                "Can't turn off — Mind races, body feels wired",
                score(3, 0, 0, 0),
            ),
            option(
                B,
                "Crash hard — Collapse on the couch, can't do anything",
                score(0, 0, 3, 0),
            ),
            option(
                C,
                "Need intense movement — Run, workout, release energy",
                score(0, 2, 0, 0),
            ),
            option(
                D,
                "Don't really feel it — Disconnected from your body",
                score(0, 0, 0, 2),
            ),
        ],
    },
    Question {
        id: 3,
        prompt: "Your relationship with rest is:",
        options: &[
            option(
                A,
                "I have to earn it — Can't relax unless everything's done",
                score(2, 1, 0, 0),
            ),
            option(
                B,
                "I crave it but can't access it — Tired but wired",
                score(3, 0, 0, 0),
            ),
            option(
                C,
                "I can drop in fairly easily — Rest feels restorative",
                score(-1, -1, -1, -1),
            ),
            option(
                D,
                "I avoid it — Stillness feels uncomfortable",
                score(0, 2, 0, 0),
            ),
        ],
    },
    Question {
        id: 4,
        prompt: "When someone says \"just breathe,\" you:",
        options: &[
            option(
                A,
                "Feel frustrated — That doesn't work for me",
                score(2, 0, 1, 0),
            ),
            option(
                B,
                "Try harder — Force deep breaths that don't help",
                score(2, 0, 0, 0),
            ),
            option(
                C,
                "Can actually use it — Breathing helps me regulate",
                score(-1, -1, -1, -1),
            ),
            option(
                D,
                "Feel more anxious — Deep breathing makes it worse",
                score(0, 0, 3, 0),
            ),
        ],
    },
    Question {
        id: 5,
        prompt: "Your typical energy pattern throughout the day:",
        options: &[
            option(
                A,
                "Steady and sustainable — Relatively consistent",
                score(-1, -1, -1, -1),
            ),
            option(
                B,
                "Starts high, crashes hard — Morning energy → afternoon collapse",
                score(2, 1, 0, 0),
            ),
            option(C, "Low all day — Never fully awake", score(0, 0, 3, 0)),
            option(
                D,
                "All over the place — Unpredictable peaks and crashes",
                score(0, 0, 0, 2),
            ),
        ],
    },
    Question {
        id: 6,
        prompt: "When you feel emotion rising, you:",
        options: &[
            option(
                A,
                "Suppress it immediately — Push it down, stay composed",
                score(3, 0, 0, 0),
            ),
            option(
                B,
                "Feel it intensely — Cry, rage, or release fully",
                score(0, 0, 1, 0),
            ),
            option(C, "Go numb — Can't access the feeling", score(0, 0, 3, 0)),
            option(
                D,
                "Get overwhelmed — It floods and takes over",
                score(1, 0, 1, 0),
            ),
        ],
    },
    Question {
        id: 7,
        prompt: "Your sleep pattern is:",
        options: &[
            option(
                A,
                "Hard to fall asleep, hard to wake up — Never feel rested",
                score(1, 2, 0, 0),
            ),
            option(
                B,
                "Fall asleep exhausted, wake up wired — Broken sleep",
                score(3, 0, 0, 0),
            ),
            option(
                C,
                "Generally restorative — Wake feeling refreshed",
                score(-1, -1, -1, -1),
            ),
            option(
                D,
                "Inconsistent — Some nights good, some terrible",
                score(0, 0, 0, 2),
            ),
        ],
    },
    Question {
        id: 8,
        prompt: "In social situations, your body tends to:",
        options: &[
            option(
                A,
                "Stay on alert — Scanning, monitoring, performing",
                score(3, 0, 0, 0),
            ),
            option(
                B,
                "Need recovery time after — People exhaust you",
                score(0, 0, 2, 0),
            ),
            option(
                C,
                "Feel energized — Connection fills you up",
                score(-1, -1, -1, -1),
            ),
            option(
                D,
                "Disconnect — You're there but not really present",
                score(0, 0, 0, 2),
            ),
        ],
    },
    Question {
        id: 9,
        prompt: "Your relationship with your body is:",
        options: &[
            option(
                A,
                "Functional — It's a tool to get things done",
                score(2, 1, 0, 0),
            ),
            option(
                B,
                "Adversarial — It betrays me, doesn't cooperate",
                score(0, 2, 1, 0),
            ),
            option(
                C,
                "Trustworthy — I listen to it and it guides me",
                score(-1, -1, -1, -1),
            ),
            option(
                D,
                "Disconnected — I don't really feel it",
                score(0, 0, 0, 3),
            ),
        ],
    },
    Question {
        id: 10,
        prompt: "Where do you feel tension most often?",
        options: &[
            option(A, "Neck, jaw, or head", score(3, 0, 0, 0)),
            option(B, "Lower back, hips, or knees", score(0, 3, 0, 0)),
            option(C, "Upper back, chest, or shoulders", score(0, 0, 3, 0)),
            option(
                D,
                "One side of my body more than the other",
                score(0, 0, 0, 3),
            ),
        ],
    },
    Question {
        id: 11,
        prompt: "When you sit for extended periods, what happens?",
        options: &[
            option(
                A,
                "My head/neck jutts forward, shoulders hunch",
                score(2, 0, 0, 0),
            ),
            option(
                B,
                "My lower back arches or I slump into my pelvis",
                score(0, 2, 0, 0),
            ),
            option(C, "My upper back rounds forward", score(0, 0, 2, 0)),
            option(D, "I lean or shift to one side", score(0, 0, 0, 2)),
        ],
    },
    Question {
        id: 12,
        prompt: "How would you describe your breathing pattern?",
        options: &[
            option(A, "Shallow, mostly in my chest", score(2, 0, 1, 0)),
            option(B, "I hold my breath or sigh frequently", score(2, 0, 0, 0)),
            option(
                C,
                "I feel like I can't take a full deep breath",
                score(0, 0, 3, 0),
            ),
            option(
                D,
                "My breathing feels uneven or asymmetrical",
                score(0, 0, 0, 2),
            ),
        ],
    },
    Question {
        id: 13,
        prompt: "Do you experience regular pain, stiffness, or compression in joints?",
        options: &[
            option(A, "Neck, jaw, or headaches", score(2, 0, 0, 0)),
            option(B, "Lower back, SI joint, or knee pain", score(0, 2, 0, 0)),
            option(
                C,
                "Upper back, between shoulder blades",
                score(0, 0, 2, 0),
            ),
            option(D, "One-sided pain patterns", score(0, 0, 0, 3)),
        ],
    },
    Question {
        id: 14,
        prompt: "How do your feet feel when standing?",
        options: &[
            option(
                A,
                "I don't notice them much / balanced",
                score(-1, -1, -1, -1),
            ),
            option(B, "My arches feel collapsed or flat", score(0, 2, 0, 0)),
            option(C, "I shift weight to my toes", score(1, 0, 0, 0)),
            option(D, "I favor one foot over the other", score(0, 0, 0, 3)),
        ],
    },
    Question {
        id: 15,
        prompt: "Which movement is most restricted for you?",
        options: &[
            option(A, "Looking up or extending my neck", score(2, 0, 0, 0)),
            option(
                B,
                "Bending forward or touching my toes",
                score(0, 2, 0, 0),
            ),
            option(
                C,
                "Reaching overhead or opening my chest",
                score(0, 0, 3, 0),
            ),
            option(D, "Rotating or side-bending", score(0, 0, 0, 3)),
        ],
    },
    Question {
        id: 16,
        prompt: "Do you have a dominant side you favor?",
        options: &[
            option(A, "Yes, significantly", score(0, 0, 0, 3)),
            option(B, "Somewhat", score(0, 0, 0, 1)),
            option(C, "No, I'm fairly balanced", score(0, 0, 0, -1)),
        ],
    },
    Question {
        id: 17,
        prompt: "How do you feel about back-bending or opening your chest?",
        options: &[
            option(
                A,
                "Very difficult, uncomfortable, or scary",
                score(0, 0, 3, 0),
            ),
            option(B, "Somewhat challenging", score(0, 0, 1, 0)),
            option(C, "Comfortable and natural", score(0, 0, -1, 0)),
        ],
    },
    Question {
        id: 18,
        prompt: "When you squat, what happens?",
        options: &[
            option(A, "My heels lift, can't go deep", score(0, 2, 0, 0)),
            option(B, "My knees collapse inward", score(0, 2, 0, 0)),
            option(
                C,
                "My lower back rounds excessively",
                score(0, 0, 1, 0),
            ),
            option(
                D,
                "Squats feel relatively comfortable",
                score(-1, -1, -1, -1),
            ),
        ],
    },
    Question {
        id: 19,
        prompt: "Do you feel coordinated in your movement?",
        options: &[
            option(A, "Yes, I move fluidly", score(-1, -1, -1, -1)),
            option(B, "Sometimes clumsy or uncoordinated", score(0, 0, 0, 2)),
            option(
                C,
                "My left and right sides feel very different",
                score(0, 0, 0, 3),
            ),
        ],
    },
    Question {
        id: 20,
        prompt: "If you could change one thing about how your body responds to stress, it would be:",
        options: &[
            option(
                A,
                "Stop holding tension everywhere — Let go physically",
                score(2, 0, 0, 0),
            ),
            option(
                B,
                "Actually feel calm — Not just fake it",
                score(2, 0, 0, 0),
            ),
            option(
                C,
                "Have consistent energy — Stop the crashes",
                score(0, 2, 1, 0),
            ),
            option(
                D,
                "Reconnect — Feel present in my body",
                score(0, 0, 0, 2),
            ),
        ],
    },
];
