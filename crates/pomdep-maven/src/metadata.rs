//! `maven-metadata.xml` parsing for version discovery.

use pomdep_util::errors::PomdepError;
use quick_xml::events::Event;
use quick_xml::Reader;

/// The versions listed under `<versioning><versions>`, in document order
/// with duplicates removed. Every other element is ignored.
pub fn parse_versions(xml: &str) -> miette::Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut versions: Vec<String> = Vec::new();
    let mut open: Vec<Vec<u8>> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => open.push(e.name().as_ref().to_vec()),
            Ok(Event::End(_)) => {
                open.pop();
            }
            Ok(Event::Text(e)) if in_version_list(&open) => {
                let version = e.unescape().unwrap_or_default().trim().to_string();
                if !version.is_empty() && !versions.contains(&version) {
                    versions.push(version);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PomdepError::Descriptor {
                    message: format!("Failed to parse maven-metadata.xml: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }

    Ok(versions)
}

fn in_version_list(open: &[Vec<u8>]) -> bool {
    matches!(
        open,
        [metadata, versioning, versions, version]
            if metadata == b"metadata"
                && versioning == b"versioning"
                && versions == b"versions"
                && version == b"version"
    )
}
