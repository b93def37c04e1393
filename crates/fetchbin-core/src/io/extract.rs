//! Archive extraction module
//!
//! Handles tar.gz, tar.zst, plain tar, zip and raw single-file artifacts.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use zip::ZipArchive;
use zstd::stream::Decoder as ZstdDecoder;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Archive error: {0}")]
    Archive(String),
}

/// Container format of a downloaded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    TarGz,
    TarZst,
    Tar,
    Zip,
    /// The download is the executable itself.
    Binary,
}

/// Information about an extracted file
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    /// Path relative to extraction root
    pub relative_path: PathBuf,
    /// Absolute path on disk
    pub absolute_path: PathBuf,
}

/// Detect archive format from a file name or URL.
pub fn detect_format(name: &str) -> ArtifactFormat {
    let name = name.to_lowercase();

    if name.ends_with(".tar.zst") || name.ends_with(".tzst") {
        ArtifactFormat::TarZst
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        ArtifactFormat::TarGz
    } else if name.ends_with(".tar") {
        ArtifactFormat::Tar
    } else if name.ends_with(".zip") {
        ArtifactFormat::Zip
    } else {
        ArtifactFormat::Binary
    }
}

/// Extract a tar.zst archive to a destination directory
pub fn extract_tar_zst(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let reader = BufReader::new(File::open(archive_path)?);
    extract_tar(ZstdDecoder::new(reader)?, dest_dir)
}

/// Extract a tar.gz archive to a destination directory
pub fn extract_tar_gz(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let reader = BufReader::new(File::open(archive_path)?);
    extract_tar(flate2::read::GzDecoder::new(reader), dest_dir)
}

fn extract_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<Vec<ExtractedFile>, ExtractError> {
    fs::create_dir_all(dest_dir)?;

    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    let mut extracted_files = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        if entry.header().entry_type().is_dir() {
            continue;
        }

        let relative_path = entry.path()?.into_owned();

        // unpack_in refuses absolute paths and `..` components.
        if !entry.unpack_in(dest_dir)? {
            return Err(ExtractError::Archive(format!(
                "Invalid path in archive: {}",
                relative_path.display()
            )));
        }

        extracted_files.push(ExtractedFile {
            absolute_path: dest_dir.join(&relative_path),
            relative_path,
        });
    }

    Ok(extracted_files)
}

/// Extract a zip archive
pub fn extract_zip(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| ExtractError::Archive(e.to_string()))?;

    fs::create_dir_all(dest_dir)?;
    let mut extracted_files = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| ExtractError::Archive(e.to_string()))?;
        let Some(relative_path) = file.enclosed_name() else {
            return Err(ExtractError::Archive(format!(
                "Invalid path in archive: {}",
                file.name()
            )));
        };

        let absolute_path = dest_dir.join(&relative_path);
        if file.is_dir() {
            fs::create_dir_all(&absolute_path)?;
            continue;
        }

        if let Some(p) = absolute_path.parent() {
            fs::create_dir_all(p)?;
        }

        let mut outfile = File::create(&absolute_path)?;
        io::copy(&mut file, &mut outfile)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                fs::set_permissions(&absolute_path, fs::Permissions::from_mode(mode))?;
            }
        }

        extracted_files.push(ExtractedFile {
            relative_path,
            absolute_path,
        });
    }

    Ok(extracted_files)
}

/// Extract `archive_path` according to `format`.
///
/// A [`ArtifactFormat::Binary`] artifact is copied into `dest_dir` under its
/// own file name.
pub fn extract(
    archive_path: &Path,
    format: ArtifactFormat,
    dest_dir: &Path,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    tracing::debug!(
        "extracting {} ({format:?}) into {}",
        archive_path.display(),
        dest_dir.display()
    );
    match format {
        ArtifactFormat::TarZst => extract_tar_zst(archive_path, dest_dir),
        ArtifactFormat::TarGz => extract_tar_gz(archive_path, dest_dir),
        ArtifactFormat::Tar => {
            let file = File::open(archive_path)?;
            extract_tar(BufReader::new(file), dest_dir)
        }
        ArtifactFormat::Zip => extract_zip(archive_path, dest_dir),
        ArtifactFormat::Binary => {
            fs::create_dir_all(dest_dir)?;
            let filename = archive_path
                .file_name()
                .ok_or_else(|| ExtractError::Archive("Invalid filename".to_string()))?;
            let dest_path = dest_dir.join(filename);
            fs::copy(archive_path, &dest_path)?;

            Ok(vec![ExtractedFile {
                relative_path: PathBuf::from(filename),
                absolute_path: dest_path,
            }])
        }
    }
}

/// Find `relative` among extracted files.
///
/// Archives often wrap everything in `name-version/`; when every
/// non-hidden entry shares one top-level directory, `relative` is also
/// looked up beneath it.
pub fn find_file<'a>(files: &'a [ExtractedFile], relative: &Path) -> Option<&'a ExtractedFile> {
    let wanted = normalize(relative);
    if let Some(found) = files.iter().find(|f| normalize(&f.relative_path) == wanted) {
        return Some(found);
    }

    let wrapper = single_wrapper(files)?;
    let wrapped = Path::new(wrapper).join(&wanted);
    files
        .iter()
        .find(|f| normalize(&f.relative_path) == wrapped)
}

// Top-level directory shared by every entry, ignoring dotfiles like `.DS_Store`.
fn single_wrapper(files: &[ExtractedFile]) -> Option<&OsStr> {
    let mut tops = files.iter().filter_map(|f| {
        let mut parts = f.relative_path.components().filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        });
        let top = parts.next()?;
        if top.to_string_lossy().starts_with('.') {
            return None;
        }
        Some((top, parts.next().is_some()))
    });

    let (first, nested) = tops.next()?;
    (nested && tops.all(|(top, nested)| nested && top == first)).then_some(first)
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tempfile::tempdir;

    fn tar_gz(path: &Path, files: &[(&str, &[u8], u32)]) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, data, mode) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(*mode);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format("foo.tar.zst"), ArtifactFormat::TarZst);
        assert_eq!(detect_format("foo.tar.gz"), ArtifactFormat::TarGz);
        assert_eq!(detect_format("foo.tgz"), ArtifactFormat::TarGz);
        assert_eq!(detect_format("archive.tar"), ArtifactFormat::Tar);
        assert_eq!(detect_format("archive.tzst"), ArtifactFormat::TarZst);
        assert_eq!(detect_format("kflex"), ArtifactFormat::Binary);
        assert_eq!(
            detect_format("https://github.com/kubestellar/kubeflex/releases/download/v0.7.2/kubeflex_0.7.2_linux_amd64.tar.gz"),
            ArtifactFormat::TarGz
        );
    }

    #[test]
    fn test_detect_format_case_insensitive() {
        assert_eq!(detect_format("FOO.TAR.ZST"), ArtifactFormat::TarZst);
        assert_eq!(detect_format("bar.TAR.GZ"), ArtifactFormat::TarGz);
        assert_eq!(detect_format("BAZ.ZIP"), ArtifactFormat::Zip);
    }

    #[test]
    fn test_extract_tar_gz() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("kubeflex.tar.gz");
        tar_gz(
            &archive,
            &[
                ("bin/kflex", b"#!/bin/sh\necho kflex\n", 0o755),
                ("README.md", b"docs", 0o644),
            ],
        );

        let dest = dir.path().join("out");
        let files = extract(&archive, ArtifactFormat::TarGz, &dest).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(
            fs::read(dest.join("bin/kflex")).unwrap(),
            b"#!/bin/sh\necho kflex\n"
        );
        assert!(files.iter().any(|f| f.relative_path == Path::new("bin/kflex")));
    }

    #[test]
    fn test_extract_corrupt_archive() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("broken.tar.gz");
        fs::write(&archive, b"definitely not gzip").unwrap();
        assert!(extract(&archive, ArtifactFormat::TarGz, &dir.path().join("out")).is_err());
    }

    #[test]
    fn test_extract_zip() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("tool.zip");
        {
            let mut writer = zip::ZipWriter::new(File::create(&archive).unwrap());
            let options = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
            writer.start_file("tool/bin/tool", options).unwrap();
            io::Write::write_all(&mut writer, b"zip payload").unwrap();
            writer.finish().unwrap();
        }

        let dest = dir.path().join("out");
        extract(&archive, ArtifactFormat::Zip, &dest).unwrap();
        assert_eq!(fs::read(dest.join("tool/bin/tool")).unwrap(), b"zip payload");
    }

    #[test]
    fn test_extract_raw_binary() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("mybin");
        fs::write(&src, b"binary content").unwrap();

        let dest = dir.path().join("extracted");
        let files = extract(&src, ArtifactFormat::Binary, &dest).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path.to_str(), Some("mybin"));
        assert!(files[0].absolute_path.starts_with(&dest));
    }

    fn listed(paths: &[&str]) -> Vec<ExtractedFile> {
        paths
            .iter()
            .map(|p| ExtractedFile {
                relative_path: PathBuf::from(p),
                absolute_path: Path::new("/unpacked").join(p),
            })
            .collect()
    }

    #[test]
    fn test_find_file_direct() {
        let files = listed(&["bin/kflex", "LICENSE"]);
        let found = find_file(&files, Path::new("bin/kflex")).unwrap();
        assert_eq!(found.absolute_path, Path::new("/unpacked/bin/kflex"));
    }

    #[test]
    fn test_find_file_ignores_dot_prefix() {
        let files = listed(&["./bin/kflex"]);
        assert!(find_file(&files, Path::new("bin/kflex")).is_some());
    }

    #[test]
    fn test_find_file_beneath_wrapper() {
        let files = listed(&["kubeflex_0.7.2/bin/kflex", "kubeflex_0.7.2/README.md"]);
        let found = find_file(&files, Path::new("bin/kflex")).unwrap();
        assert_eq!(
            found.relative_path,
            Path::new("kubeflex_0.7.2/bin/kflex")
        );
    }

    #[test]
    fn test_find_file_wrapper_with_same_name_child() {
        let files = listed(&["kflex/kflex"]);
        let found = find_file(&files, Path::new("kflex")).unwrap();
        assert_eq!(found.relative_path, Path::new("kflex/kflex"));
    }

    #[test]
    fn test_find_file_ignores_hidden_top_level_files() {
        let files = listed(&[".DS_Store", "tool/bin/tool"]);
        assert!(find_file(&files, Path::new("bin/tool")).is_some());
    }

    #[test]
    fn test_find_file_no_wrapper_for_mixed_layout() {
        let files = listed(&["a/bin/tool", "b/other"]);
        assert!(find_file(&files, Path::new("bin/tool")).is_none());
        let flat = listed(&["tool", "README.md"]);
        assert!(find_file(&flat, Path::new("bin/tool")).is_none());
    }
}
