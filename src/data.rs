//! Upstream snapshot loading: fetch (with an on-disk cache), parse, and select
//! the set revision to assemble.

use crate::config::PatchSelector;
use crate::error::{Error, Result, ValidationError};
use crate::model::{Document, SetEntry};
use serde::Deserialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const CDRAGON_BASE: &str = "https://raw.communitydragon.org";

/// Cached documents for `latest`/`pbe` are refetched after this long.
const MOVING_SELECTOR_TTL: Duration = Duration::from_secs(3600);

pub fn document_url(selector: &PatchSelector) -> String {
    format!("{}/{}/cdragon/tft/en_us.json", CDRAGON_BASE, selector)
}

/// Public URL of a game asset for a patch. Texture extensions are served as PNG.
pub fn image_url(patch: &str, icon: &str) -> String {
    let path = icon
        .to_lowercase()
        .replace(".tex", ".png")
        .replace(".dds", ".png");
    format!("{}/{}/game/{}", CDRAGON_BASE, patch, path)
}

pub fn get_cache_dir() -> Result<PathBuf> {
    let project_dirs = directories::ProjectDirs::from("com", "communitydragon", "tft-reference")
        .ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "could not determine cache directory",
            ))
        })?;
    let cache_dir = project_dirs.cache_dir().to_path_buf();
    fs::create_dir_all(&cache_dir)?;
    Ok(cache_dir)
}

/// Downloads the document for `selector` into the cache unless a fresh copy is
/// already there, and returns its path.
pub fn fetch_document(selector: &PatchSelector, force: bool) -> Result<PathBuf> {
    let cache_dir = get_cache_dir()?.join(selector.as_str());
    fs::create_dir_all(&cache_dir)?;
    let target_path = cache_dir.join("en_us.json");

    let expiration = selector.is_moving().then_some(MOVING_SELECTOR_TTL);
    if !force && is_fresh(&target_path, expiration) {
        debug!("Using cached document {}", target_path.display());
        return Ok(target_path);
    }

    let client = http_client()?;
    let url = document_url(selector);
    info!("Downloading {}", url);
    download_to_path(&client, &url, &target_path)?;
    Ok(target_path)
}

fn is_fresh(path: &Path, expiration: Option<Duration>) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    match expiration {
        None => true,
        Some(exp) => metadata
            .modified()
            .ok()
            .and_then(|modified| modified.elapsed().ok())
            .is_some_and(|elapsed| elapsed <= exp),
    }
}

/// Resolves `latest`/`pbe` to the concrete patch they currently point at,
/// e.g. `14.23`. Concrete patches are returned as is.
pub fn resolve_patch(selector: &PatchSelector) -> Result<String> {
    match selector {
        PatchSelector::Patch(patch) => Ok(patch.clone()),
        moving => {
            let client = http_client()?;
            let patch = fetch_patch_version(&client, &metadata_url(moving))?;
            info!("{} is patch {}", moving, patch);
            Ok(patch)
        }
    }
}

pub fn metadata_url(selector: &PatchSelector) -> String {
    format!("{}/{}/content-metadata.json", CDRAGON_BASE, selector)
}

#[derive(Deserialize)]
struct ContentMetadata {
    version: String,
}

fn fetch_patch_version(client: &reqwest::blocking::Client, url: &str) -> Result<String> {
    let response = client.get(url).send()?;
    if !response.status().is_success() {
        return Err(Error::Upstream(format!(
            "failed to fetch {}: {}",
            url,
            response.status()
        )));
    }
    let metadata: ContentMetadata = serde_json::from_str(&response.text()?)?;
    patch_from_version(&metadata.version).ok_or_else(|| {
        Error::Upstream(format!(
            "unrecognised version {} in {}",
            metadata.version, url
        ))
    })
}

/// `15.5.658.6291+branch.releases-15-5...` → `15.5`.
pub fn patch_from_version(version: &str) -> Option<String> {
    let mut parts = version.split('.');
    let major = parts.next().filter(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))?;
    let minor = parts.next()?;
    let minor_len = minor.bytes().take_while(u8::is_ascii_digit).count();
    if minor_len == 0 {
        return None;
    }
    Some(format!("{}.{}", major, &minor[..minor_len]))
}

fn download_to_path(client: &reqwest::blocking::Client, url: &str, path: &Path) -> Result<()> {
    let mut response = client.get(url).send()?;
    if !response.status().is_success() {
        return Err(Error::Upstream(format!(
            "failed to download {}: {}",
            url,
            response.status()
        )));
    }

    // A failed transfer must not leave a truncated document behind as "cached".
    let part_path = path.with_extension("json.part");
    let copied = match write_part(&mut response, &part_path) {
        Ok(copied) => copied,
        Err(err) => {
            if let Err(remove_err) = fs::remove_file(&part_path) {
                debug!("Could not remove {}: {}", part_path.display(), remove_err);
            }
            return Err(err);
        }
    };
    fs::rename(&part_path, path)?;
    debug!("Downloaded {} bytes to {}", copied, path.display());
    Ok(())
}

fn write_part(response: &mut reqwest::blocking::Response, part_path: &Path) -> Result<u64> {
    let mut file = fs::File::create(part_path)?;
    let copied = response.copy_to(&mut file)?;
    file.flush()?;
    Ok(copied)
}

fn http_client() -> Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder().build()?)
}

pub fn load_document(path: &Path) -> Result<Document> {
    if !path.exists() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("file not found: {}", path.display()),
        )));
    }
    let file = fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    let document: Document = serde_json::from_reader(reader)?;
    Ok(document)
}

/// Standard (ranked) set mutators: `TFTSet<N>`, optionally with a `_Stage2`
/// or `_Evolved` suffix. `_Evolved` is Set 13's name for the mid-set revision.
pub fn is_standard_mutator(mutator: &str) -> bool {
    let Some(rest) = mutator.strip_prefix("TFTSet") else {
        return false;
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return false;
    }
    matches!(&rest[digits..], "" | "_Stage2" | "_Evolved")
}

/// Picks the set entry to assemble.
///
/// With an override, the mutator must match exactly. Otherwise the standard
/// entry with the greatest `(number, mutator)` wins, so `TFTSet9_Stage2` beats
/// `TFTSet9` and any `TFTSet10*` beats both.
pub fn select_set<'a>(
    document: &'a Document,
    mutator_override: Option<&str>,
) -> Result<&'a SetEntry> {
    if let Some(mutator) = mutator_override {
        return document
            .set_data
            .iter()
            .find(|entry| entry.mutator == mutator)
            .ok_or_else(|| ValidationError::MutatorNotFound(mutator.to_string()).into());
    }

    document
        .set_data
        .iter()
        .filter(|entry| is_standard_mutator(&entry.mutator))
        .max_by(|a, b| (a.number, &a.mutator).cmp(&(b.number, &b.mutator)))
        .ok_or_else(|| {
            ValidationError::NoStandardSet(
                document
                    .set_data
                    .iter()
                    .map(|entry| entry.mutator.clone())
                    .collect(),
            )
            .into()
        })
}
