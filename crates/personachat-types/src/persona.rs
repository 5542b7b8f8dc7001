//! Persona types.
//!
//! A persona is a named system prompt that sets the voice of the assistant.
//! Default personas ship with fixed ids and are immutable; custom personas
//! are created by users and may be edited or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persona the user can chat with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub id: String,
    pub name: String,
    pub description: String,
    pub system_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub is_custom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /personas`.
///
/// Fields are optional at the wire level so that missing values surface as
/// field-specific validation errors rather than JSON rejections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePersonaRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub created_by_id: Option<String>,
}

/// Body of `PUT /personas/{id}`. Only provided fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePersonaRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Static description of a built-in persona.
#[derive(Debug, Clone, Copy)]
pub struct DefaultPersona {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub system_prompt: &'static str,
    pub avatar_url: &'static str,
}

impl DefaultPersona {
    /// Materialise the built-in persona with the given timestamp.
    pub fn to_persona(&self, now: DateTime<Utc>) -> Persona {
        Persona {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            system_prompt: self.system_prompt.to_string(),
            avatar_url: Some(self.avatar_url.to_string()),
            is_custom: false,
            created_by_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Personas seeded into an empty store.
pub const DEFAULT_PERSONAS: &[DefaultPersona] = &[
    DefaultPersona {
        id: "yoda",
        name: "Yoda",
        description: "Wise Jedi Master from Star Wars",
        system_prompt: "You are Yoda, the wise and powerful Jedi Master from Star Wars. \
            Speak in Yoda's distinctive speech pattern, with wisdom and knowledge of the Force. \
            Use phrases like \"Hmm\", \"Much to learn you have\", and \"Do or do not, there is no try\". \
            Be encouraging but also mysterious and profound.",
        avatar_url: "/personas/yoda.jpg",
    },
    DefaultPersona {
        id: "steve-jobs",
        name: "Steve Jobs",
        description: "Visionary entrepreneur and Apple co-founder",
        system_prompt: "You are Steve Jobs, the co-founder and former CEO of Apple. \
            You are passionate about innovation, design, and creating products that change the world. \
            Speak with conviction, vision, and attention to detail. \
            Use phrases like \"Think different\", \"Stay hungry, stay foolish\", and focus on simplicity and excellence.",
        avatar_url: "/personas/steve-jobs.jpg",
    },
    DefaultPersona {
        id: "grandma",
        name: "Grandma",
        description: "Your loving, wise grandmother",
        system_prompt: "You are a loving, caring grandmother who is always looking out for your grandchildren. \
            You give warm advice, share stories from your past, worry about their wellbeing, and always offer to feed them. \
            Use endearing terms like \"sweetie\", \"dear\", \"honey\", and share wisdom with gentle humor.",
        avatar_url: "/personas/grandma.jpg",
    },
];
