//! ## Summary
//! Import pipeline: structural checks, validation and upsert of assembled
//! objects, one store lookup and at most one write per object.

use std::collections::BTreeMap;
use std::io::{Read, Seek};
use std::time::{Duration, Instant};

use kunai_core::constants::{MISSING_UID_KEY, MIXED_BASE_COMPONENT_KEY, NO_BASE_COMPONENT_KEY};
use kunai_core::options::ImportOptions;
use kunai_core::types::{ErrorPolicy, ValidatePolicy};
use kunai_rfc::rfc::ical::build::serialize;
use kunai_rfc::rfc::ical::core::ICalendar;
use kunai_rfc::rfc::validation::{Issue, Profile, Severity, Validator, at_least};
use serde::Serialize;

use super::assemble::{AssembledObject, assemble};
use super::index::index;
use crate::error::{ServiceError, ServiceResult};
use crate::store::CalendarStore;

/// Issues at or above this severity block an import.
pub const BLOCKING_SEVERITY: Severity = Severity::Error;

/// Structural reasons to reject an object before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportRejection {
    NoBaseComponents,
    MixedComponentTypes,
    MissingUid,
}

impl ImportRejection {
    /// Outcome bucket recording this rejection.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::NoBaseComponents => NO_BASE_COMPONENT_KEY,
            Self::MixedComponentTypes => MIXED_BASE_COMPONENT_KEY,
            Self::MissingUid => MISSING_UID_KEY,
        }
    }
}

impl std::fmt::Display for ImportRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::NoBaseComponents => "object has no base component",
            Self::MixedComponentTypes => "object mixes base component types",
            Self::MissingUid => "base component has no UID",
        })
    }
}

/// ## Summary
/// Checks the base components of a document and returns its UID.
///
/// ## Errors
/// Returns the first structural rejection that applies.
pub fn check_structure(document: &ICalendar) -> Result<String, ImportRejection> {
    let base = document.base_components();
    let first = base.first().ok_or(ImportRejection::NoBaseComponents)?;

    if base.iter().any(|component| component.name != first.name) {
        return Err(ImportRejection::MixedComponentTypes);
    }

    first
        .uid()
        .map(str::to_string)
        .ok_or(ImportRejection::MissingUid)
}

/// Outcome for one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "messages", rename_all = "snake_case")]
pub enum ObjectOutcome {
    Created,
    Updated,
    Exists,
    Error(Vec<String>),
}

/// Aggregate counts of an import run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
    pub elapsed_seconds: f64,
}

/// ## Summary
/// Per-identifier outcome of an import run.
///
/// Structural rejections are collected under the `nbct`, `mbct` and `noid`
/// buckets, one message per rejected object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportOutcome {
    outcomes: BTreeMap<String, ObjectOutcome>,
    failed: usize,
    elapsed: Duration,
}

impl ImportOutcome {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ObjectOutcome> {
        self.outcomes.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ObjectOutcome)> {
        self.outcomes.iter().map(|(key, outcome)| (key.as_str(), outcome))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Counts of created, updated, skipped (already existing) and failed objects.
    #[must_use]
    pub fn summary(&self) -> ImportSummary {
        let count = |wanted: &ObjectOutcome| {
            self.outcomes.values().filter(|o| *o == wanted).count()
        };
        ImportSummary {
            created: count(&ObjectOutcome::Created),
            updated: count(&ObjectOutcome::Updated),
            skipped: count(&ObjectOutcome::Exists),
            errors: self.failed,
            elapsed_seconds: self.elapsed.as_secs_f64(),
        }
    }

    fn record(&mut self, key: String, outcome: ObjectOutcome) {
        self.outcomes.insert(key, outcome);
    }

    fn record_errors(&mut self, key: &str, messages: Vec<String>) {
        self.failed += 1;
        match self.outcomes.get_mut(key) {
            Some(ObjectOutcome::Error(existing)) => existing.extend(messages),
            _ => {
                self.outcomes.insert(key.to_string(), ObjectOutcome::Error(messages));
            }
        }
    }
}

/// ## Summary
/// Runs assembled objects through checks, validation and the store.
pub struct ImportPipeline<'a, S: ?Sized, V: ?Sized> {
    options: ImportOptions,
    store: &'a S,
    validator: &'a V,
    calendar: &'a str,
}

impl<'a, S, V> ImportPipeline<'a, S, V>
where
    S: CalendarStore + ?Sized,
    V: Validator + ?Sized,
{
    #[must_use]
    pub const fn new(
        options: ImportOptions,
        store: &'a S,
        validator: &'a V,
        calendar: &'a str,
    ) -> Self {
        Self {
            options,
            store,
            validator,
            calendar,
        }
    }

    /// ## Summary
    /// Imports every object of the sequence.
    ///
    /// Per-object failures are recorded or abort the run depending on the
    /// error and validation policies. Read and scan failures of the source
    /// always abort.
    ///
    /// ## Errors
    /// Returns the first failure the policies do not allow to record.
    #[tracing::instrument(skip_all, fields(calendar = self.calendar, format = %self.options.format))]
    pub async fn run<I>(&self, objects: I) -> ServiceResult<ImportOutcome>
    where
        I: IntoIterator<Item = ServiceResult<AssembledObject>>,
    {
        let started = Instant::now();
        let mut outcome = ImportOutcome::default();

        for object in objects {
            match object {
                Ok(object) => self.import_object(object, &mut outcome).await?,
                Err(ServiceError::ObjectParse { identifier, source })
                    if self.options.error_policy == ErrorPolicy::Continue =>
                {
                    tracing::warn!(%identifier, error = %source, "Skipping unparseable object");
                    outcome.record_errors(&identifier, vec![source.to_string()]);
                }
                Err(e) => return Err(e),
            }
        }

        outcome.elapsed = started.elapsed();
        let summary = outcome.summary();
        tracing::info!(
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped,
            errors = summary.errors,
            elapsed_seconds = summary.elapsed_seconds,
            "Import finished"
        );
        Ok(outcome)
    }

    async fn import_object(
        &self,
        object: AssembledObject,
        outcome: &mut ImportOutcome,
    ) -> ServiceResult<()> {
        let identifier = object.identifier();
        let mut document = object.document;

        let uid = match check_structure(&document) {
            Ok(uid) => uid,
            Err(rejection) => {
                if self.options.error_policy == ErrorPolicy::Abort {
                    return Err(ServiceError::Rejected(rejection));
                }
                tracing::warn!(%identifier, %rejection, "Rejected object");
                outcome.record_errors(
                    rejection.key(),
                    vec![format!("{identifier}: {rejection}")],
                );
                return Ok(());
            }
        };

        if self.options.validate_policy != ValidatePolicy::Off {
            let issues = self.validate(&mut document);
            if !issues.is_empty() {
                let messages: Vec<String> =
                    issues.into_iter().map(|issue| issue.message).collect();
                if self.options.validate_policy == ValidatePolicy::FailOnIssue {
                    return Err(ServiceError::Validation {
                        uid,
                        message: messages.join("; "),
                    });
                }
                tracing::warn!(%uid, issues = messages.len(), "Skipping invalid object");
                outcome.record_errors(&uid, messages);
                return Ok(());
            }
        }

        match self.upsert(&uid, &document).await {
            Ok(result) => {
                tracing::debug!(%uid, ?result, "Imported object");
                outcome.record(uid, result);
                Ok(())
            }
            Err(ServiceError::StoreError(e))
                if self.options.error_policy == ErrorPolicy::Continue =>
            {
                tracing::warn!(%uid, error = %e, "Store rejected object");
                outcome.record_errors(&uid, vec![e.to_string()]);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Validates, repairs when anything was found, and returns the blocking
    /// issues left after the repair.
    fn validate(&self, document: &mut ICalendar) -> Vec<Issue> {
        let issues = self.validator.validate(document, Profile::CalDav);
        if issues.is_empty() {
            return issues;
        }

        let repaired = self.validator.repair(document);
        tracing::debug!(found = issues.len(), repaired = repaired.len(), "Repaired object");
        at_least(self.validator.validate(document, Profile::CalDav), BLOCKING_SEVERITY)
    }

    async fn upsert(&self, uid: &str, document: &ICalendar) -> ServiceResult<ObjectOutcome> {
        let existing = self.store.find_by_uid(self.calendar, uid).await?;
        match existing {
            None => {
                let object_id = format!("{}.ics", uuid::Uuid::new_v4());
                self.store
                    .create(self.calendar, &object_id, &serialize(document))
                    .await?;
                Ok(ObjectOutcome::Created)
            }
            Some(object_id) if self.options.supersede => {
                self.store
                    .update(self.calendar, &object_id, &serialize(document))
                    .await?;
                Ok(ObjectOutcome::Updated)
            }
            Some(_) => Ok(ObjectOutcome::Exists),
        }
    }
}

/// ## Summary
/// Imports a calendar document from a seekable source into `calendar`.
///
/// The source is indexed with the indexer of `options.format`, then
/// assembled and imported one object at a time.
///
/// ## Errors
/// Returns an error if the source cannot be indexed, or the first per-object
/// failure the policies do not allow to record.
#[tracing::instrument(skip(source, store, validator), fields(format = %options.format))]
pub async fn import_calendar<R, S, V>(
    source: &mut R,
    options: ImportOptions,
    store: &S,
    validator: &V,
    calendar: &str,
) -> ServiceResult<ImportOutcome>
where
    R: Read + Seek,
    S: CalendarStore + ?Sized,
    V: Validator + ?Sized,
{
    let indexed = index(source, options.format)?;
    let objects = assemble(indexed, source, options.format)?;
    ImportPipeline::new(options, store, validator, calendar)
        .run(objects)
        .await
}

#[cfg(test)]
#[path = "import_tests.rs"]
mod tests;
