//! File-tree CRUD for posts and their language contents.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use corpus_core::error::CoreError;
use corpus_core::frontmatter::{self, ContentFile, FrontMatter};
use corpus_core::groups::Group;
use corpus_core::naming;
use corpus_core::paths::{self, PostId};
use corpus_core::title;
use corpus_core::types::{ContentStatus, GroupMode};
use tracing::debug;

use crate::types::{
    CreatePostInput, CreatedPost, LanguageSummary, PostContent, PostSummary, UpdateOutcome,
    UpdatePostInput,
};

/// The file-backed content store, rooted at a content directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // -----------------------------------------------------------------------
    // Post CRUD
    // -----------------------------------------------------------------------

    /// Create a post with version 1 and one language file.
    ///
    /// Slug mode derives a unique slug from the title, deduplicated against
    /// existing directory names. Timestamp mode floors the current time to
    /// the minute.
    pub fn create_post(
        &self,
        group: &Group,
        input: &CreatePostInput,
    ) -> Result<CreatedPost, CoreError> {
        let language = input
            .language
            .clone()
            .unwrap_or_else(|| group.language.clone());
        let group_dir = self.root.join(&group.slug);

        let id = match group.mode {
            GroupMode::Slug => {
                let slug = naming::unique_slug(&input.title, |candidate| {
                    group_dir.join(candidate).exists()
                });
                PostId::Slug(slug)
            }
            GroupMode::Timestamp => {
                let now = Utc::now();
                let id = PostId::Stamp {
                    date: now.format("%Y-%m-%d").to_string(),
                    time: now.format("%H:%M").to_string(),
                };
                if paths::post_dir(&self.root, &group.slug, &id).exists() {
                    return Err(CoreError::AlreadyExists(id.base_id()));
                }
                id
            }
        };

        let version_dir = paths::version_dir(&self.root, &group.slug, &id, 1);
        ensure_dir(&version_dir)?;

        let now = Utc::now();
        let file = ContentFile {
            front: FrontMatter {
                slug: id.base_id(),
                status: ContentStatus::Draft,
                created_at: Some(now),
                updated_at: Some(now),
                created_by: input.created_by.clone(),
                created_by_email: input.created_by_email.clone(),
                version: Some(1),
                ..Default::default()
            },
            body: input.body.clone(),
        };
        let path = version_dir.join(paths::content_file_name(&language));
        write_file(&path, &frontmatter::serialize(&file))?;
        debug!(group = %group.slug, id = %id.base_id(), %language, "post created");

        Ok(CreatedPost {
            base_id: id.base_id(),
            id,
            version: 1,
            language,
            path,
        })
    }

    /// Read a post's content, resolving version then language.
    ///
    /// Version resolves to the explicit number or the latest on disk (the
    /// legacy layout when no version directories exist). Language resolves
    /// to the explicit code, else the group's configured language, else the
    /// first available file. A missing language file in an existing version
    /// directory yields an empty new-translation placeholder, not an error.
    pub fn read_post(
        &self,
        group: &Group,
        id: &PostId,
        language: Option<&str>,
        version: Option<i64>,
    ) -> Result<PostContent, CoreError> {
        let post_dir = self.require_post_dir(group, id)?;
        let resolved_version = self.resolve_version(&post_dir, version)?;
        let dir = match resolved_version {
            Some(v) => post_dir.join(paths::version_dir_name(v)),
            None => post_dir,
        };

        let requested = language.unwrap_or(&group.language);
        let path = dir.join(paths::content_file_name(requested));
        if path.exists() {
            return self.read_content(id, resolved_version, requested, &path, false);
        }

        // Requested language absent. Without an explicit request, fall back
        // to the first language on disk before giving up on a placeholder.
        if language.is_none() {
            if let Some(first) = self.languages_in(&dir)?.into_iter().next() {
                let path = dir.join(paths::content_file_name(&first));
                return self.read_content(id, resolved_version, &first, &path, false);
            }
        }

        Ok(PostContent {
            id: id.clone(),
            version: resolved_version,
            language: requested.to_string(),
            file: ContentFile {
                front: FrontMatter {
                    slug: id.base_id(),
                    version: resolved_version,
                    ..Default::default()
                },
                body: String::new(),
            },
            title: title::UNTITLED.to_string(),
            is_new_translation: true,
        })
    }

    /// Rewrite a post's language file, optionally relocating the tree under
    /// a new slug and propagating a primary-language status change to the
    /// version's other language files.
    pub fn update_post(
        &self,
        group: &Group,
        id: &PostId,
        language: &str,
        version: Option<i64>,
        input: &UpdatePostInput,
    ) -> Result<UpdateOutcome, CoreError> {
        let mut id = id.clone();
        let post_dir = self.require_post_dir(group, &id)?;
        let resolved_version = self.resolve_version(&post_dir, version)?;

        // Slug relocation first, so the file rewrite below lands in the new
        // tree.
        let mut slug_changed = false;
        if let Some(new_slug) = &input.new_slug {
            if group.mode == GroupMode::Slug && *new_slug != id.base_id() {
                naming::validate_slug(new_slug)?;
                let new_id = PostId::Slug(new_slug.clone());
                let new_dir = paths::post_dir(&self.root, &group.slug, &new_id);
                if new_dir.exists() {
                    return Err(CoreError::SlugAlreadyExists(new_slug.clone()));
                }
                fs::rename(&post_dir, &new_dir).map_err(|source| CoreError::WriteFailed {
                    path: new_dir.display().to_string(),
                    source,
                })?;
                id = new_id;
                slug_changed = true;
                self.rewrite_embedded_slug(group, &id, new_slug)?;
            }
        }

        let dir = match resolved_version {
            Some(v) => paths::version_dir(&self.root, &group.slug, &id, v),
            None => paths::post_dir(&self.root, &group.slug, &id),
        };
        let path = dir.join(paths::content_file_name(language));
        if !path.exists() {
            return Err(CoreError::NotFound(path.display().to_string()));
        }
        let mut file = self.parse_file(&path)?;

        let previous_status = file.front.status;
        if let Some(body) = &input.body {
            file.body = body.clone();
        }
        if let Some(status) = input.status {
            file.front.status = status;
            if status == ContentStatus::Published && file.front.published_at.is_none() {
                file.front.published_at = Some(Utc::now());
            }
        }
        if let Some(custom_slug) = &input.custom_slug {
            file.front.custom_slug = Some(custom_slug.clone());
        }
        if let Some(description) = &input.description {
            file.front.description = Some(description.clone());
        }
        if input.updated_by.is_some() {
            file.front.updated_by = input.updated_by.clone();
        }
        if input.updated_by_email.is_some() {
            file.front.updated_by_email = input.updated_by_email.clone();
        }
        file.front.updated_at = Some(Utc::now());
        write_file(&path, &frontmatter::serialize(&file))?;

        // A status change on the primary language is propagated to every
        // other language file of the same version; their statuses are left
        // alone otherwise.
        let status_changed = file.front.status != previous_status;
        if status_changed && language == group.language {
            for other in self.languages_in(&dir)? {
                if other == language {
                    continue;
                }
                let other_path = dir.join(paths::content_file_name(&other));
                let mut other_file = self.parse_file(&other_path)?;
                other_file.front.status = file.front.status;
                other_file.front.updated_at = Some(Utc::now());
                write_file(&other_path, &frontmatter::serialize(&other_file))?;
            }
        }

        Ok(UpdateOutcome {
            id,
            slug_changed,
            status_changed,
        })
    }

    /// Soft delete archives every language file of every version; hard
    /// delete removes the whole post subtree.
    pub fn delete_post(&self, group: &Group, id: &PostId, hard: bool) -> Result<(), CoreError> {
        let post_dir = self.require_post_dir(group, id)?;
        if hard {
            return fs::remove_dir_all(&post_dir).map_err(|source| CoreError::WriteFailed {
                path: post_dir.display().to_string(),
                source,
            });
        }
        for dir in self.content_dirs(&post_dir)? {
            for language in self.languages_in(&dir)? {
                let path = dir.join(paths::content_file_name(&language));
                let mut file = self.parse_file(&path)?;
                file.front.status = ContentStatus::Archived;
                file.front.updated_at = Some(Utc::now());
                write_file(&path, &frontmatter::serialize(&file))?;
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Languages
    // -----------------------------------------------------------------------

    /// Add a new draft, empty-body language file to a version.
    pub fn add_language(
        &self,
        group: &Group,
        id: &PostId,
        version: Option<i64>,
        language: &str,
    ) -> Result<PathBuf, CoreError> {
        let post_dir = self.require_post_dir(group, id)?;
        let resolved_version = self.resolve_version(&post_dir, version)?;
        let dir = match resolved_version {
            Some(v) => post_dir.join(paths::version_dir_name(v)),
            None => post_dir,
        };
        let path = dir.join(paths::content_file_name(language));
        if path.exists() {
            return Err(CoreError::AlreadyExists(language.to_string()));
        }

        let now = Utc::now();
        let file = ContentFile {
            front: FrontMatter {
                slug: id.base_id(),
                status: ContentStatus::Draft,
                created_at: Some(now),
                updated_at: Some(now),
                version: resolved_version,
                ..Default::default()
            },
            body: String::new(),
        };
        write_file(&path, &frontmatter::serialize(&file))?;
        Ok(path)
    }

    /// Archive a language file. Refused when fewer than two non-archived
    /// languages remain: a version always keeps one active language.
    pub fn delete_language(
        &self,
        group: &Group,
        id: &PostId,
        version: Option<i64>,
        language: &str,
    ) -> Result<(), CoreError> {
        let post_dir = self.require_post_dir(group, id)?;
        let resolved_version = self.resolve_version(&post_dir, version)?;
        let dir = match resolved_version {
            Some(v) => post_dir.join(paths::version_dir_name(v)),
            None => post_dir,
        };
        let path = dir.join(paths::content_file_name(language));
        if !path.exists() {
            return Err(CoreError::NotFound(path.display().to_string()));
        }

        let mut active = 0;
        for other in self.languages_in(&dir)? {
            let file = self.parse_file(&dir.join(paths::content_file_name(&other)))?;
            if file.front.status != ContentStatus::Archived {
                active += 1;
            }
        }
        if active < 2 {
            return Err(CoreError::LastLanguage);
        }

        let mut file = self.parse_file(&path)?;
        file.front.status = ContentStatus::Archived;
        file.front.updated_at = Some(Utc::now());
        write_file(&path, &frontmatter::serialize(&file))
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    /// Enumerate a group's posts on disk. Slug mode is alphabetical,
    /// timestamp mode newest first.
    pub fn post_ids(&self, group: &Group) -> Result<Vec<PostId>, CoreError> {
        let group_dir = self.root.join(&group.slug);
        if !group_dir.exists() {
            return Ok(Vec::new());
        }

        let mut base_ids = Vec::new();
        match group.mode {
            GroupMode::Slug => {
                for name in dir_names(&group_dir)? {
                    base_ids.push(name);
                }
                base_ids.sort();
            }
            GroupMode::Timestamp => {
                for date in dir_names(&group_dir)? {
                    if !paths::is_date_segment(&date) {
                        continue;
                    }
                    for time in dir_names(&group_dir.join(&date))? {
                        if paths::is_time_segment(&time) {
                            base_ids.push(format!("{date}/{time}"));
                        }
                    }
                }
                // Newest first.
                base_ids.sort();
                base_ids.reverse();
            }
        }

        Ok(base_ids
            .iter()
            .filter_map(|base| PostId::from_base_id(group.mode, base))
            .collect())
    }

    /// Version numbers of a post, ascending. Empty for the legacy layout.
    pub fn version_list(&self, group: &Group, id: &PostId) -> Result<Vec<i64>, CoreError> {
        let post_dir = self.require_post_dir(group, id)?;
        self.version_numbers(&post_dir)
    }

    /// Language codes of a post version (or the legacy layout), sorted.
    pub fn language_list(
        &self,
        group: &Group,
        id: &PostId,
        version: Option<i64>,
    ) -> Result<Vec<String>, CoreError> {
        let post_dir = self.require_post_dir(group, id)?;
        let dir = match version {
            Some(v) => post_dir.join(paths::version_dir_name(v)),
            None => post_dir,
        };
        self.languages_in(&dir)
    }

    /// Direct scan of a group's posts into listing projections. Used for
    /// cache regeneration and as the uncached fallback on a coalesced miss.
    pub fn list_posts(&self, group: &Group) -> Result<Vec<PostSummary>, CoreError> {
        let ids = self.post_ids(group)?;
        let mut summaries = Vec::with_capacity(ids.len());
        for id in &ids {
            summaries.push(self.summarize_post(group, id)?);
        }
        Ok(summaries)
    }

    /// Listing projection of a single post from its latest version.
    pub fn summarize_post(&self, group: &Group, id: &PostId) -> Result<PostSummary, CoreError> {
        let post_dir = self.require_post_dir(group, id)?;
        let versions = self.version_numbers(&post_dir)?;
        let latest = versions.last().copied();
        let dir = match latest {
            Some(v) => post_dir.join(paths::version_dir_name(v)),
            None => post_dir,
        };

        let mut languages = Vec::new();
        for language in self.languages_in(&dir)? {
            let file = self.parse_file(&dir.join(paths::content_file_name(&language)))?;
            languages.push(LanguageSummary {
                language,
                title: title::extract_title(&file.body),
                excerpt: title::excerpt(&file.body),
                status: file.front.status,
                updated_at: file.front.updated_at,
            });
        }

        // Post-level status follows the primary language, else the first.
        let status = languages
            .iter()
            .find(|l| l.language == group.language)
            .or_else(|| languages.first())
            .map(|l| l.status)
            .unwrap_or_default();

        Ok(PostSummary {
            base_id: id.base_id(),
            has_version_info: latest.is_some(),
            latest_version: latest,
            status,
            languages,
        })
    }

    // -----------------------------------------------------------------------
    // Shared helpers
    // -----------------------------------------------------------------------

    pub(crate) fn require_post_dir(&self, group: &Group, id: &PostId) -> Result<PathBuf, CoreError> {
        let dir = paths::post_dir(&self.root, &group.slug, id);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(CoreError::PostNotFound(id.base_id()))
        }
    }

    /// Resolve an optional version to a concrete directory choice:
    /// `Some(n)` for a version directory, `None` for the legacy layout.
    pub(crate) fn resolve_version(
        &self,
        post_dir: &Path,
        version: Option<i64>,
    ) -> Result<Option<i64>, CoreError> {
        match version {
            Some(v) => {
                if post_dir.join(paths::version_dir_name(v)).is_dir() {
                    Ok(Some(v))
                } else {
                    Err(CoreError::NotFound(format!("version {v}")))
                }
            }
            None => Ok(self.version_numbers(post_dir)?.last().copied()),
        }
    }

    /// Version numbers present under a post directory, ascending.
    pub(crate) fn version_numbers(&self, post_dir: &Path) -> Result<Vec<i64>, CoreError> {
        let mut numbers: Vec<i64> = dir_names(post_dir)?
            .iter()
            .filter_map(|name| paths::parse_version_dir(name))
            .collect();
        numbers.sort_unstable();
        Ok(numbers)
    }

    /// Language codes of the content files in a directory, sorted.
    pub(crate) fn languages_in(&self, dir: &Path) -> Result<Vec<String>, CoreError> {
        let entries = fs::read_dir(dir).map_err(|source| CoreError::ReadFailed {
            path: dir.display().to_string(),
            source,
        })?;
        let mut languages = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CoreError::ReadFailed {
                path: dir.display().to_string(),
                source,
            })?;
            if let Some(language) = entry
                .file_name()
                .to_str()
                .and_then(paths::parse_content_file)
            {
                languages.push(language);
            }
        }
        languages.sort();
        Ok(languages)
    }

    /// All directories holding content files of a post: every version
    /// directory, plus the post directory itself when legacy files remain.
    pub(crate) fn content_dirs(&self, post_dir: &Path) -> Result<Vec<PathBuf>, CoreError> {
        let mut dirs: Vec<PathBuf> = self
            .version_numbers(post_dir)?
            .into_iter()
            .map(|v| post_dir.join(paths::version_dir_name(v)))
            .collect();
        if !self.languages_in(post_dir)?.is_empty() {
            dirs.push(post_dir.to_path_buf());
        }
        Ok(dirs)
    }

    pub(crate) fn parse_file(&self, path: &Path) -> Result<ContentFile, CoreError> {
        let text = fs::read_to_string(path).map_err(|source| CoreError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Ok(frontmatter::parse(&text))
    }

    fn read_content(
        &self,
        id: &PostId,
        version: Option<i64>,
        language: &str,
        path: &Path,
        is_new_translation: bool,
    ) -> Result<PostContent, CoreError> {
        let file = self.parse_file(path)?;
        Ok(PostContent {
            id: id.clone(),
            version,
            language: language.to_string(),
            title: title::extract_title(&file.body),
            file,
            is_new_translation,
        })
    }

    /// Rewrite the embedded slug field in every language file of every
    /// version after a tree relocation, so each file stays self-describing.
    fn rewrite_embedded_slug(
        &self,
        group: &Group,
        id: &PostId,
        new_slug: &str,
    ) -> Result<(), CoreError> {
        let post_dir = paths::post_dir(&self.root, &group.slug, id);
        for dir in self.content_dirs(&post_dir)? {
            for language in self.languages_in(&dir)? {
                let path = dir.join(paths::content_file_name(&language));
                let mut file = self.parse_file(&path)?;
                if file.front.slug != new_slug {
                    file.front.slug = new_slug.to_string();
                    write_file(&path, &frontmatter::serialize(&file))?;
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Filesystem helpers
// ---------------------------------------------------------------------------

pub(crate) fn ensure_dir(dir: &Path) -> Result<(), CoreError> {
    fs::create_dir_all(dir).map_err(|source| CoreError::MkdirFailed {
        path: dir.display().to_string(),
        source,
    })
}

pub(crate) fn write_file(path: &Path, text: &str) -> Result<(), CoreError> {
    fs::write(path, text).map_err(|source| CoreError::WriteFailed {
        path: path.display().to_string(),
        source,
    })
}

fn dir_names(dir: &Path) -> Result<Vec<String>, CoreError> {
    let entries = fs::read_dir(dir).map_err(|source| CoreError::ReadFailed {
        path: dir.display().to_string(),
        source,
    })?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CoreError::ReadFailed {
            path: dir.display().to_string(),
            source,
        })?;
        let is_dir = entry
            .file_type()
            .map(|t| t.is_dir())
            .map_err(|source: io::Error| CoreError::ReadFailed {
                path: dir.display().to_string(),
                source,
            })?;
        if is_dir {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
