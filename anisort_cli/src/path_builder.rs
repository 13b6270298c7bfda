//! Destination paths from a handlebars template
//!
//! Available fields: `anime`, `anime_english`, `year`, `episode`,
//! `episode_title`, `group`, `group_name`, `resolution`, `source`,
//! `quality`, `crc32`, `extension`, `fid`, `aid`, `eid`.
//!
//! Values are sanitised before rendering, so a `/` in the template is the
//! only thing that creates a directory.

use anisort_core::error::ValidationError;
use anisort_core::{IdentificationResult, PathBuilder};
use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderError,
    RenderErrorReason, no_escape,
};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};

const TEMPLATE_NAME: &str = "destination";
const ELLIPSIS: char = '…';

pub struct TemplatePathBuilder {
    handlebars: Handlebars<'static>,
    max_length: usize,
}

impl TemplatePathBuilder {
    pub fn new(template: &str, max_length: usize) -> anisort_core::Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(no_escape);
        register_helpers(&mut handlebars);
        handlebars
            .register_template_string(TEMPLATE_NAME, template)
            .map_err(|e| {
                ValidationError::invalid_configuration(&format!("invalid rename template: {e}"))
            })?;

        Ok(Self {
            handlebars,
            max_length,
        })
    }

    fn render(&self, fields: &Map<String, Value>) -> anisort_core::Result<PathBuf> {
        let rendered = self
            .handlebars
            .render(TEMPLATE_NAME, fields)
            .map_err(|e| {
                ValidationError::invalid_configuration(&format!("rename template failed: {e}"))
            })?;

        // Empty segments come from missing values; never let them make the path absolute
        let path: PathBuf = rendered
            .split(['/', '\\'])
            .map(str::trim)
            .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
            .collect();

        if path.as_os_str().is_empty() {
            return Err(ValidationError::invalid_parameter(
                "template",
                "rendered an empty destination",
            )
            .into());
        }
        Ok(path)
    }
}

impl PathBuilder for TemplatePathBuilder {
    fn build(&self, result: &IdentificationResult) -> anisort_core::Result<PathBuf> {
        let mut fields = template_fields(result);
        let mut path = self.render(&fields)?;

        // Shorten the episode title first, then the anime title
        for key in ["episode_title", "anime"] {
            while length(&path) > self.max_length {
                let Some(Value::String(value)) = fields.get(key) else {
                    break;
                };
                if value.is_empty() {
                    break;
                }
                // The default template uses the anime title twice
                let occurrences = path.to_string_lossy().matches(value.as_str()).count().max(1);
                let excess = (length(&path) - self.max_length).div_ceil(occurrences);
                let Some(shorter) = ellipsize(value, excess) else {
                    break;
                };
                fields.insert(key.to_string(), Value::String(shorter));
                path = self.render(&fields)?;
            }
        }

        if length(&path) > self.max_length {
            return Err(ValidationError::path_too_long(&path, self.max_length).into());
        }
        Ok(path)
    }
}

fn length(path: &Path) -> usize {
    path.to_string_lossy().chars().count()
}

/// Drop `excess` characters (at least one) and mark the cut. `None` once
/// nothing is left to drop.
fn ellipsize(value: &str, excess: usize) -> Option<String> {
    let kept: Vec<char> = value.trim_end_matches(ELLIPSIS).chars().collect();
    if kept.is_empty() {
        return None;
    }
    let keep = kept.len().saturating_sub(excess.max(1));
    let mut shorter: String = kept[..keep].iter().collect();
    shorter = shorter.trim_end().to_string();
    shorter.push(ELLIPSIS);
    Some(shorter)
}

/// Replace characters that are not allowed in file names on common filesystems
pub fn sanitize(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '/' | '\\' | '|' => '-',
            ':' => ' ',
            '*' | '?' | '"' | '<' | '>' => '_',
            other => other,
        })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_end_matches('.').to_string()
}

fn template_fields(result: &IdentificationResult) -> Map<String, Value> {
    let lookup = &result.lookup;
    let anime = lookup.anime.as_ref();
    let episode = lookup.episode.as_ref();
    let group = lookup.group.as_ref();

    let extension = lookup.file.file_type.clone().or_else(|| {
        result
            .file
            .path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
    });

    let text = [
        ("anime", anime.and_then(|a| a.preferred_title().map(str::to_string))),
        ("anime_english", anime.and_then(|a| a.english_name.clone())),
        ("year", anime.and_then(|a| a.year.clone())),
        ("episode", episode.and_then(|e| e.number.clone())),
        (
            "episode_title",
            episode.and_then(|e| e.english_name.clone().or_else(|| e.romaji_name.clone())),
        ),
        (
            "group",
            group.and_then(|g| g.short_name.clone().or_else(|| g.name.clone())),
        ),
        ("group_name", group.and_then(|g| g.name.clone())),
        ("resolution", result.resolution.map(|r| r.to_string())),
        ("source", lookup.file.source.clone()),
        ("quality", lookup.file.quality.clone()),
        ("crc32", lookup.file.crc32.clone()),
        ("extension", extension),
    ];

    let mut fields = Map::new();
    for (key, value) in text {
        let value = value.map(|v| sanitize(&v)).unwrap_or_default();
        fields.insert(key.to_string(), Value::String(value));
    }
    fields.insert("fid".to_string(), json!(lookup.file.fid));
    fields.insert("aid".to_string(), json!(lookup.file.aid));
    fields.insert("eid".to_string(), json!(lookup.file.eid));
    fields
}

fn register_helpers(handlebars: &mut Handlebars) {
    handlebars.register_helper("pad", Box::new(pad_helper));
    handlebars.register_helper("lowercase", Box::new(lowercase_helper));
}

/// `{{pad episode 2}}` zero-pads numeric episode numbers, leaves "S1" alone
fn pad_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let value = h.param(0).map(|p| p.value()).ok_or_else(|| {
        RenderError::from(RenderErrorReason::Other("pad expects 2 parameters".into()))
    })?;
    let width = h
        .param(1)
        .and_then(|p| p.value().as_u64())
        .ok_or_else(|| {
            RenderError::from(RenderErrorReason::Other("pad expects a width".into()))
        })? as usize;

    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    };
    if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
        out.write(&format!("{text:0>width$}"))?;
    } else {
        out.write(&text)?;
    }
    Ok(())
}

fn lowercase_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let text = h
        .param(0)
        .and_then(|p| p.value().as_str())
        .ok_or_else(|| {
            RenderError::from(RenderErrorReason::Other("lowercase expects a string".into()))
        })?;
    out.write(&text.to_lowercase())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TEMPLATE;
    use anisort_core::LocalFile;
    use anisort_core::metadata::{
        AnimeMetadata, EpisodeMetadata, FileLookup, FileMetadata, GroupMetadata, Resolution,
    };

    fn result(anime: &str, episode_title: &str) -> IdentificationResult {
        let lookup = FileLookup {
            file: FileMetadata {
                fid: 4242,
                aid: Some(1),
                eid: Some(10),
                gid: Some(100),
                file_type: Some("mkv".into()),
                video_resolution: Some(Resolution::new(1920, 1080)),
                ..Default::default()
            },
            anime: Some(AnimeMetadata {
                aid: 1,
                romaji_name: Some(anime.into()),
                ..Default::default()
            }),
            episode: Some(EpisodeMetadata {
                eid: 10,
                aid: 1,
                number: Some("1".into()),
                english_name: Some(episode_title.into()),
                ..Default::default()
            }),
            group: Some(GroupMetadata {
                gid: 100,
                name: Some("Example Subs".into()),
                short_name: Some("ES".into()),
            }),
        };
        IdentificationResult::new(LocalFile::new(1, "/incoming/file.mkv"), lookup)
    }

    #[test]
    fn test_default_template() {
        let builder = TemplatePathBuilder::new(DEFAULT_TEMPLATE, 240).unwrap();
        let path = builder.build(&result("Cowboy Bebop", "Asteroid Blues")).unwrap();
        assert_eq!(
            path,
            PathBuf::from("Cowboy Bebop/Cowboy Bebop - 1 - Asteroid Blues [ES][1920x1080].mkv")
        );
    }

    #[test]
    fn test_resolution_block_is_optional() {
        let builder = TemplatePathBuilder::new(DEFAULT_TEMPLATE, 240).unwrap();
        let mut identified = result("Cowboy Bebop", "Asteroid Blues");
        identified.resolution = None;
        let path = builder.build(&identified).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "Cowboy Bebop - 1 - Asteroid Blues [ES].mkv"
        );
    }

    #[test]
    fn test_values_cannot_create_directories() {
        let builder = TemplatePathBuilder::new("{{anime}}/{{episode_title}}.{{extension}}", 240).unwrap();
        let path = builder.build(&result("Fate/Zero", "What? <Who>: \"me\"")).unwrap();
        assert_eq!(path, PathBuf::from("Fate-Zero/What_ _Who_ _me_.mkv"));
    }

    #[test]
    fn test_missing_anime_does_not_produce_absolute_path() {
        let builder = TemplatePathBuilder::new(DEFAULT_TEMPLATE, 240).unwrap();
        let mut identified = result("x", "Asteroid Blues");
        identified.lookup.anime = None;
        let path = builder.build(&identified).unwrap();
        assert!(path.is_relative());
        assert_eq!(path.components().count(), 1);
    }

    #[test]
    fn test_episode_title_is_shortened_first() {
        let long_title = "A".repeat(80);
        let builder = TemplatePathBuilder::new(DEFAULT_TEMPLATE, 70).unwrap();
        let path = builder.build(&result("Cowboy Bebop", &long_title)).unwrap();
        let rendered = path.to_string_lossy().into_owned();

        assert!(rendered.chars().count() <= 70);
        assert!(rendered.starts_with("Cowboy Bebop/Cowboy Bebop - 1 - A"));
        assert!(rendered.contains('…'));
    }

    #[test]
    fn test_anime_title_is_shortened_when_episode_title_is_not_enough() {
        let builder = TemplatePathBuilder::new(DEFAULT_TEMPLATE, 60).unwrap();
        let path = builder
            .build(&result(&"Very Long Anime Title ".repeat(4), "Short"))
            .unwrap();
        let rendered = path.to_string_lossy().into_owned();

        assert!(rendered.chars().count() <= 60);
        assert!(rendered.starts_with("Very"));
        assert!(rendered.ends_with(".mkv"));
    }

    #[test]
    fn test_impossible_limit_is_an_error() {
        let builder = TemplatePathBuilder::new(DEFAULT_TEMPLATE, 10).unwrap();
        let error = builder.build(&result("Cowboy Bebop", "Asteroid Blues")).unwrap_err();
        assert!(matches!(
            error,
            anisort_core::Error::Validation(ValidationError::PathTooLong { max_length: 10, .. })
        ));
    }

    #[test]
    fn test_pad_helper() {
        let builder =
            TemplatePathBuilder::new("{{lowercase anime}} {{pad episode 3}}.{{extension}}", 240).unwrap();
        let path = builder.build(&result("Cowboy Bebop", "x")).unwrap();
        assert_eq!(path, PathBuf::from("cowboy bebop 001.mkv"));
    }

    #[test]
    fn test_invalid_template_is_rejected() {
        assert!(TemplatePathBuilder::new("{{#if anime}}", 240).is_err());
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Re:Zero"), "Re Zero");
        assert_eq!(sanitize("  Trailing dots...  "), "Trailing dots");
        assert_eq!(sanitize("tab\there"), "tab here");
    }
}
