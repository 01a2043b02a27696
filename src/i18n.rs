// Bangla/English interface strings

use serde::{Deserialize, Serialize};

/// Interface and answer language. Bangla is the default, as on the website.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Bn,
    En,
}

impl Language {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Bn => "bn",
            Self::En => "en",
        }
    }

    /// Anything other than `bn` is treated as English.
    pub fn from_code(code: &str) -> Self {
        if code.trim().eq_ignore_ascii_case("bn") {
            Self::Bn
        } else {
            Self::En
        }
    }

    pub const fn toggle(self) -> Self {
        match self {
            Self::Bn => Self::En,
            Self::En => Self::Bn,
        }
    }

    pub const fn is_bangla(self) -> bool {
        matches!(self, Self::Bn)
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Bn => "বাংলা",
            Self::En => "English",
        }
    }

    pub const fn assistant_title(self) -> &'static str {
        match self {
            Self::Bn => "নাগরিক সহায়ক",
            Self::En => "Civic Assistant",
        }
    }

    pub const fn verify_title(self) -> &'static str {
        match self {
            Self::Bn => "ভুয়া তথ্য শনাক্তকারী",
            Self::En => "Misinformation Detector",
        }
    }

    pub const fn welcome(self) -> &'static str {
        match self {
            Self::Bn => "ভোটিং, সরকারি সেবা এবং নাগরিক অধিকার সম্পর্কে আমাকে কিছু জিজ্ঞাসা করুন।",
            Self::En => "Ask me anything about voting, government services, and civic rights.",
        }
    }

    pub const fn chat_placeholder(self) -> &'static str {
        match self {
            Self::Bn => "আপনার প্রশ্ন টাইপ করুন...",
            Self::En => "Type your question...",
        }
    }

    pub const fn verify_placeholder(self) -> &'static str {
        match self {
            Self::Bn => "যাচাই করতে চান এমন তথ্য লিখুন, অথবা /image <path>",
            Self::En => "Enter information to verify, or /image <path>",
        }
    }

    pub const fn disclaimer(self) -> &'static str {
        match self {
            Self::Bn => "এই সহায়ক AI-চালিত এবং ভুল হতে পারে। গুরুত্বপূর্ণ সিদ্ধান্তের জন্য সরকারি সূত্র যাচাই করুন।",
            Self::En => "This assistant is AI-powered and may make mistakes. Verify with official sources for important decisions.",
        }
    }

    pub const fn learn_more(self) -> &'static str {
        match self {
            Self::Bn => "আরও জানুন:",
            Self::En => "Learn more:",
        }
    }

    pub const fn you(self) -> &'static str {
        match self {
            Self::Bn => "আপনি",
            Self::En => "You",
        }
    }

    pub const fn suggested_questions(self) -> &'static [&'static str] {
        match self {
            Self::Bn => &[
                "কীভাবে ভোটার হিসাবে নিবন্ধন করব?",
                "NID কার্ডের জন্য আবেদন করার পদ্ধতি কী?",
                "আমার নাগরিক অধিকার কী কী?",
                "জন্ম নিবন্ধন কীভাবে পাব?",
            ],
            Self::En => &[
                "How do I register as a voter?",
                "What is the process for applying for an NID card?",
                "What are my civic rights?",
                "How can I get a birth certificate?",
            ],
        }
    }

    pub const fn error_title(self) -> &'static str {
        match self {
            Self::Bn => "ত্রুটি",
            Self::En => "Error",
        }
    }

    pub const fn send_failed(self) -> &'static str {
        match self {
            Self::Bn => "বার্তা পাঠাতে ব্যর্থ হয়েছে",
            Self::En => "Failed to send message",
        }
    }

    pub const fn rate_limited(self) -> &'static str {
        match self {
            Self::Bn => "অনুরোধের সীমা অতিক্রম করেছে, অনুগ্রহ করে পরে আবার চেষ্টা করুন।",
            Self::En => "Rate limit exceeded, please try again later.",
        }
    }

    pub const fn payment_required(self) -> &'static str {
        match self {
            Self::Bn => "পেমেন্ট প্রয়োজন, অনুগ্রহ করে আপনার ওয়ার্কস্পেসে তহবিল যোগ করুন।",
            Self::En => "Payment required, please add funds to your workspace.",
        }
    }

    pub const fn input_required(self) -> &'static str {
        match self {
            Self::Bn => "অনুগ্রহ করে টেক্সট লিখুন বা ছবি আপলোড করুন",
            Self::En => "Please enter text or upload an image",
        }
    }

    pub const fn image_too_large(self) -> &'static str {
        match self {
            Self::Bn => "ফাইলের আকার ৫ এমবি এর কম হতে হবে",
            Self::En => "File size must be less than 5MB",
        }
    }

    pub const fn unsupported_image(self) -> &'static str {
        match self {
            Self::Bn => "শুধুমাত্র ছবি ফাইল সমর্থিত",
            Self::En => "Only image files are supported",
        }
    }

    pub const fn analyzing(self) -> &'static str {
        match self {
            Self::Bn => "বিশ্লেষণ চলছে...",
            Self::En => "Analyzing...",
        }
    }

    pub const fn analysis_complete(self) -> &'static str {
        match self {
            Self::Bn => "তথ্য যাচাই সম্পন্ন হয়েছে",
            Self::En => "Information verification completed",
        }
    }

    pub const fn analysis_failed(self) -> &'static str {
        match self {
            Self::Bn => "বিশ্লেষণে ত্রুটি হয়েছে",
            Self::En => "Analysis failed",
        }
    }

    pub const fn transcript_saved(self) -> &'static str {
        match self {
            Self::Bn => "কথোপকথন সংরক্ষিত হয়েছে",
            Self::En => "Conversation saved",
        }
    }
}
