//! Exercise data model.
//!
//! Defines the stored [`Exercise`] record, the payloads used to create
//! ([`NewExercise`]) and patch ([`ExercisePatch`]) it, and the fixed
//! enumerations ([`Representation`], [`NetworkTier`]) the guided learning
//! path is built from.
//!
//! Text fields are normalized on write: titles, categories, definition and
//! ampliation texts and network types are uppercased, languages are
//! lowercased. Asset references are stored untouched.

use serde::{Deserialize, Serialize};

use crate::error::{ExerciseError, Result};

// ============================================================================
// Identifiers
// ============================================================================

/// Store-assigned identifier of an exercise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExerciseId(String);

impl ExerciseId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ExerciseId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ExerciseId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ExerciseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a teacher as reported by the identity service.
///
/// Compared as an opaque value. The identity service may report ids as JSON
/// numbers or strings; both deserialize to the same textual form, so `7` and
/// `"7"` are the same teacher.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TeacherId(String);

impl TeacherId {
    /// Creates a teacher id from its textual form.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for TeacherId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Self(text),
            Raw::Number(number) => Self(number.to_string()),
        })
    }
}

impl std::fmt::Display for TeacherId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Fixed Enumerations
// ============================================================================

/// Pedagogical representation style, in increasing sophistication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Representation {
    /// Pictures that look like what they mean.
    Iconic,
    /// Pictures mixed with symbols.
    Mixed,
    /// Whole-word recognition.
    Global,
    /// Purely symbolic.
    Symbolic,
}

impl Representation {
    /// Returns the stored (uppercase) label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Iconic => "ICONIC",
            Self::Mixed => "MIXED",
            Self::Global => "GLOBAL",
            Self::Symbolic => "SYMBOLIC",
        }
    }
}

impl std::fmt::Display for Representation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural complexity class of an exercise: how many input/output
/// elements it involves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkTier {
    /// One input, one output.
    #[serde(rename = "I-I")]
    OneToOne,
    /// One input, two outputs.
    #[serde(rename = "I-II")]
    OneToTwo,
    /// One input, three outputs.
    #[serde(rename = "I-III")]
    OneToThree,
}

impl NetworkTier {
    /// Returns the stored label (`I-I`, `I-II` or `I-III`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OneToOne => "I-I",
            Self::OneToTwo => "I-II",
            Self::OneToThree => "I-III",
        }
    }

    /// Parses a stored network type label.
    ///
    /// Matching is exact: stored values are already uppercase. Returns `None`
    /// for any label outside the fixed enumeration.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "I-I" => Some(Self::OneToOne),
            "I-II" => Some(Self::OneToTwo),
            "I-III" => Some(Self::OneToThree),
            _ => None,
        }
    }
}

impl std::fmt::Display for NetworkTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Exercise
// ============================================================================

/// A stored exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    /// Store-assigned identifier.
    #[serde(rename = "_id")]
    pub id: ExerciseId,

    /// Title, uppercase.
    pub title: String,

    /// Category, uppercase.
    pub category: String,

    /// Reference to the main image asset.
    pub main_image: String,

    /// Reference to the definition image asset.
    pub definition_image: String,

    /// Definition text, uppercase.
    pub definition_text: String,

    /// References to the ampliation image assets, in display order.
    pub ampliation_images: Vec<String>,

    /// Ampliation texts, uppercase, in display order.
    pub ampliation_text: Vec<String>,

    /// Reference to the definition pictogram asset.
    pub definition_pictogram: String,

    /// Reference to the ampliation pictogram asset.
    pub ampliation_pictogram: String,

    /// Network type label, uppercase. See [`NetworkTier`].
    pub network_type: String,

    /// Representation label, uppercase. See [`Representation`].
    pub representation: String,

    /// Language code, lowercase.
    pub language: String,

    /// Owning teacher; absent for seeded content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<TeacherId>,

    /// Position used by the closed-order listing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_order: Option<i64>,
}

impl Exercise {
    /// Returns the network tier, or `None` if the stored label is outside
    /// the fixed enumeration.
    #[must_use]
    pub fn network_tier(&self) -> Option<NetworkTier> {
        NetworkTier::from_label(&self.network_type)
    }

    /// Returns `true` if `teacher` owns this exercise.
    ///
    /// Unowned exercises are owned by nobody.
    #[must_use]
    pub fn is_owned_by(&self, teacher: &TeacherId) -> bool {
        self.teacher_id.as_ref() == Some(teacher)
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Collects "field is required" messages during validation.
#[derive(Default)]
struct Violations(Vec<String>);

impl Violations {
    fn text(&mut self, field: &str, label: &str, value: Option<&String>) {
        if value.map_or(true, |v| v.trim().is_empty()) {
            self.0.push(format!("{field}: {label} is required"));
        }
    }

    fn list(&mut self, field: &str, label: &str, value: Option<&Vec<String>>) {
        match value {
            None => self.0.push(format!("{field}: {label} is required")),
            Some(items) if items.is_empty() => {
                self.0.push(format!("{field}: {label} is required"));
            }
            Some(items) if items.iter().any(|item| item.trim().is_empty()) => {
                self.0.push(format!("{field}: {label} must not contain empty entries"));
            }
            Some(_) => {}
        }
    }

    fn into_result(self) -> Result<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ExerciseError::validation(self.0.join(", ")))
        }
    }
}

fn upper(items: Vec<String>) -> Vec<String> {
    items.into_iter().map(|item| item.to_uppercase()).collect()
}

/// Payload for creating an exercise.
///
/// Every field is optional at the type level so that missing fields surface
/// as a [`ExerciseError::Validation`] listing all of them rather than as a
/// deserialization failure. Unknown fields, including `teacherId`, are
/// ignored: ownership is stamped by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewExercise {
    /// Title.
    pub title: Option<String>,
    /// Category.
    pub category: Option<String>,
    /// Main image reference.
    pub main_image: Option<String>,
    /// Definition image reference.
    pub definition_image: Option<String>,
    /// Definition text.
    pub definition_text: Option<String>,
    /// Ampliation image references.
    pub ampliation_images: Option<Vec<String>>,
    /// Ampliation texts.
    pub ampliation_text: Option<Vec<String>>,
    /// Definition pictogram reference.
    pub definition_pictogram: Option<String>,
    /// Ampliation pictogram reference.
    pub ampliation_pictogram: Option<String>,
    /// Network type label.
    pub network_type: Option<String>,
    /// Representation label.
    pub representation: Option<String>,
    /// Language code.
    pub language: Option<String>,
    /// Closed-order position.
    pub closed_order: Option<i64>,
}

impl NewExercise {
    /// Checks that every required field is present and non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`ExerciseError::Validation`] naming every offending field.
    pub fn validate(&self) -> Result<()> {
        let mut violations = Violations::default();
        violations.text("title", "title", self.title.as_ref());
        violations.text("category", "category", self.category.as_ref());
        violations.text("mainImage", "main image", self.main_image.as_ref());
        violations.text("definitionImage", "definition image", self.definition_image.as_ref());
        violations.text("definitionText", "definition text", self.definition_text.as_ref());
        violations.list("ampliationImages", "ampliation images", self.ampliation_images.as_ref());
        violations.list("ampliationText", "ampliation text", self.ampliation_text.as_ref());
        violations.text(
            "definitionPictogram",
            "definition pictogram",
            self.definition_pictogram.as_ref(),
        );
        violations.text(
            "ampliationPictogram",
            "ampliation pictogram",
            self.ampliation_pictogram.as_ref(),
        );
        violations.text("networkType", "network type", self.network_type.as_ref());
        violations.text("representation", "representation", self.representation.as_ref());
        violations.text("language", "language", self.language.as_ref());
        violations.into_result()
    }

    /// Validates and normalizes the payload into a stored exercise.
    ///
    /// # Errors
    ///
    /// Returns [`ExerciseError::Validation`] if a required field is missing.
    pub fn into_exercise(self, id: ExerciseId, owner: Option<TeacherId>) -> Result<Exercise> {
        self.validate()?;

        // validate() guarantees every field below is present
        let missing = || ExerciseError::validation("incomplete exercise payload");
        Ok(Exercise {
            id,
            title: self.title.ok_or_else(missing)?.to_uppercase(),
            category: self.category.ok_or_else(missing)?.to_uppercase(),
            main_image: self.main_image.ok_or_else(missing)?,
            definition_image: self.definition_image.ok_or_else(missing)?,
            definition_text: self.definition_text.ok_or_else(missing)?.to_uppercase(),
            ampliation_images: self.ampliation_images.ok_or_else(missing)?,
            ampliation_text: upper(self.ampliation_text.ok_or_else(missing)?),
            definition_pictogram: self.definition_pictogram.ok_or_else(missing)?,
            ampliation_pictogram: self.ampliation_pictogram.ok_or_else(missing)?,
            network_type: self.network_type.ok_or_else(missing)?.to_uppercase(),
            representation: self.representation.ok_or_else(missing)?.to_uppercase(),
            language: self.language.ok_or_else(missing)?.to_lowercase(),
            teacher_id: owner,
            closed_order: self.closed_order,
        })
    }
}

/// Partial update of an exercise.
///
/// Absent fields are left untouched. Present fields are normalized exactly
/// as on creation and must not be empty. Ownership and identity are not
/// patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExercisePatch {
    /// New title.
    pub title: Option<String>,
    /// New category.
    pub category: Option<String>,
    /// New main image reference.
    pub main_image: Option<String>,
    /// New definition image reference.
    pub definition_image: Option<String>,
    /// New definition text.
    pub definition_text: Option<String>,
    /// New ampliation image references.
    pub ampliation_images: Option<Vec<String>>,
    /// New ampliation texts.
    pub ampliation_text: Option<Vec<String>>,
    /// New definition pictogram reference.
    pub definition_pictogram: Option<String>,
    /// New ampliation pictogram reference.
    pub ampliation_pictogram: Option<String>,
    /// New network type label.
    pub network_type: Option<String>,
    /// New representation label.
    pub representation: Option<String>,
    /// New language code.
    pub language: Option<String>,
    /// New closed-order position.
    pub closed_order: Option<i64>,
}

impl ExercisePatch {
    /// Checks that no provided field is empty.
    ///
    /// # Errors
    ///
    /// Returns [`ExerciseError::Validation`] naming every offending field.
    pub fn validate(&self) -> Result<()> {
        let mut violations = Violations::default();
        if self.title.is_some() {
            violations.text("title", "title", self.title.as_ref());
        }
        if self.category.is_some() {
            violations.text("category", "category", self.category.as_ref());
        }
        if self.main_image.is_some() {
            violations.text("mainImage", "main image", self.main_image.as_ref());
        }
        if self.definition_image.is_some() {
            violations.text("definitionImage", "definition image", self.definition_image.as_ref());
        }
        if self.definition_text.is_some() {
            violations.text("definitionText", "definition text", self.definition_text.as_ref());
        }
        if self.ampliation_images.is_some() {
            violations.list("ampliationImages", "ampliation images", self.ampliation_images.as_ref());
        }
        if self.ampliation_text.is_some() {
            violations.list("ampliationText", "ampliation text", self.ampliation_text.as_ref());
        }
        if self.definition_pictogram.is_some() {
            violations.text(
                "definitionPictogram",
                "definition pictogram",
                self.definition_pictogram.as_ref(),
            );
        }
        if self.ampliation_pictogram.is_some() {
            violations.text(
                "ampliationPictogram",
                "ampliation pictogram",
                self.ampliation_pictogram.as_ref(),
            );
        }
        if self.network_type.is_some() {
            violations.text("networkType", "network type", self.network_type.as_ref());
        }
        if self.representation.is_some() {
            violations.text("representation", "representation", self.representation.as_ref());
        }
        if self.language.is_some() {
            violations.text("language", "language", self.language.as_ref());
        }
        violations.into_result()
    }

    /// Returns the patch with every provided field normalized the way it is
    /// stored: display text uppercased, language lowercased, references kept
    /// verbatim.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            title: self.title.as_deref().map(str::to_uppercase),
            category: self.category.as_deref().map(str::to_uppercase),
            main_image: self.main_image.clone(),
            definition_image: self.definition_image.clone(),
            definition_text: self.definition_text.as_deref().map(str::to_uppercase),
            ampliation_images: self.ampliation_images.clone(),
            ampliation_text: self.ampliation_text.clone().map(upper),
            definition_pictogram: self.definition_pictogram.clone(),
            ampliation_pictogram: self.ampliation_pictogram.clone(),
            network_type: self.network_type.as_deref().map(str::to_uppercase),
            representation: self.representation.as_deref().map(str::to_uppercase),
            language: self.language.as_deref().map(str::to_lowercase),
            closed_order: self.closed_order,
        }
    }

    /// Applies the patch to `exercise`, normalizing provided fields.
    ///
    /// Callers are expected to have run [`ExercisePatch::validate`].
    pub fn apply_to(&self, exercise: &mut Exercise) {
        let Self {
            title,
            category,
            main_image,
            definition_image,
            definition_text,
            ampliation_images,
            ampliation_text,
            definition_pictogram,
            ampliation_pictogram,
            network_type,
            representation,
            language,
            closed_order,
        } = self.normalized();

        if let Some(title) = title {
            exercise.title = title;
        }
        if let Some(category) = category {
            exercise.category = category;
        }
        if let Some(main_image) = main_image {
            exercise.main_image = main_image;
        }
        if let Some(definition_image) = definition_image {
            exercise.definition_image = definition_image;
        }
        if let Some(definition_text) = definition_text {
            exercise.definition_text = definition_text;
        }
        if let Some(images) = ampliation_images {
            exercise.ampliation_images = images;
        }
        if let Some(texts) = ampliation_text {
            exercise.ampliation_text = texts;
        }
        if let Some(pictogram) = definition_pictogram {
            exercise.definition_pictogram = pictogram;
        }
        if let Some(pictogram) = ampliation_pictogram {
            exercise.ampliation_pictogram = pictogram;
        }
        if let Some(network_type) = network_type {
            exercise.network_type = network_type;
        }
        if let Some(representation) = representation {
            exercise.representation = representation;
        }
        if let Some(language) = language {
            exercise.language = language;
        }
        if closed_order.is_some() {
            exercise.closed_order = closed_order;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
