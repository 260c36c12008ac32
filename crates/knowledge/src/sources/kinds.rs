//! Source kinds and their native record layouts.
//!
//! Each kind maps the JSON records its API returns onto record identity,
//! chunk base metadata and a [`RecordContent`]. Field paths are dotted
//! (`version.when`, `links.0.href`); a key containing dots is matched
//! verbatim first.

use crate::chunk::{detect_content_kind, BaseMetadata, ContentKind};
use crate::types::SourceRecordMetadata;
use magnet_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Systems records can be synced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    File,
    Salesforce,
    SharePoint,
    Confluence,
    HubSpot,
    RightNow,
    OracleKnowledge,
    Documentation,
}

/// What a record holds to be chunked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordContent {
    Text(String),
    Html(String),
    /// Content behind a link; its kind is decided after fetching
    Download {
        url: String,
        mime_type: Option<String>,
    },
    Video {
        description: String,
        video_url: String,
    },
    Unsupported {
        reason: String,
    },
}

struct FieldMap {
    id: &'static [&'static str],
    title: &'static [&'static str],
    name: &'static [&'static str],
    marker: &'static [&'static str],
    created: &'static [&'static str],
    modified: &'static [&'static str],
    source: &'static [&'static str],
}

const FILE: FieldMap = FieldMap {
    id: &["id", "path", "url"],
    title: &["title", "name"],
    name: &["name", "title"],
    marker: &["modified_time", "last_modified", "etag"],
    created: &["created_time"],
    modified: &["modified_time", "last_modified"],
    source: &["url", "path"],
};

const SALESFORCE: FieldMap = FieldMap {
    id: &["Id"],
    title: &["Title"],
    name: &["UrlName", "Title"],
    marker: &["LastModifiedDate", "SystemModstamp"],
    created: &["CreatedDate"],
    modified: &["LastModifiedDate"],
    source: &["url"],
};

const SHAREPOINT: FieldMap = FieldMap {
    id: &["id"],
    title: &["title", "name"],
    name: &["name"],
    marker: &["lastModifiedDateTime", "eTag"],
    created: &["createdDateTime"],
    modified: &["lastModifiedDateTime"],
    source: &["webUrl"],
};

const CONFLUENCE: FieldMap = FieldMap {
    id: &["id"],
    title: &["title"],
    name: &["title"],
    marker: &["version.when", "version.number"],
    created: &["history.createdDate"],
    modified: &["version.when"],
    source: &["_links.webui"],
};

const HUBSPOT: FieldMap = FieldMap {
    id: &["id"],
    title: &["properties.subject", "properties.title", "properties.name"],
    name: &["properties.subject", "properties.title", "properties.name"],
    marker: &["updatedAt", "properties.hs_lastmodifieddate"],
    created: &["createdAt"],
    modified: &["updatedAt"],
    source: &["url", "properties.hs_url"],
};

const RIGHTNOW: FieldMap = FieldMap {
    id: &["id"],
    title: &["summary"],
    name: &["summary"],
    marker: &["updatedTime"],
    created: &["createdTime"],
    modified: &["updatedTime"],
    source: &["url", "links.0.href"],
};

const ORACLE_KNOWLEDGE: FieldMap = FieldMap {
    id: &["recordId", "id"],
    title: &["title"],
    name: &["title"],
    marker: &["dateModified", "version"],
    created: &["dateAdded"],
    modified: &["dateModified"],
    source: &["url", "links.0.href"],
};

const DOCUMENTATION: FieldMap = FieldMap {
    id: &["url"],
    title: &["title"],
    name: &["title"],
    marker: &[],
    created: &[],
    modified: &[],
    source: &["url"],
};

impl SourceKind {
    pub const ALL: [SourceKind; 8] = [
        SourceKind::File,
        SourceKind::Salesforce,
        SourceKind::SharePoint,
        SourceKind::Confluence,
        SourceKind::HubSpot,
        SourceKind::RightNow,
        SourceKind::OracleKnowledge,
        SourceKind::Documentation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Salesforce => "salesforce",
            Self::SharePoint => "sharepoint",
            Self::Confluence => "confluence",
            Self::HubSpot => "hubspot",
            Self::RightNow => "rightnow",
            Self::OracleKnowledge => "oracle_knowledge",
            Self::Documentation => "documentation",
        }
    }

    fn fields(&self) -> &'static FieldMap {
        match self {
            Self::File => &FILE,
            Self::Salesforce => &SALESFORCE,
            Self::SharePoint => &SHAREPOINT,
            Self::Confluence => &CONFLUENCE,
            Self::HubSpot => &HUBSPOT,
            Self::RightNow => &RIGHTNOW,
            Self::OracleKnowledge => &ORACLE_KNOWLEDGE,
            Self::Documentation => &DOCUMENTATION,
        }
    }

    /// Record id, if the record has one.
    pub fn record_id(&self, record: &Value) -> Option<String> {
        first_field(record, self.fields().id)
    }

    /// Identity and change marker used for incremental planning.
    pub fn basic_metadata(&self, record: &Value) -> AppResult<SourceRecordMetadata> {
        let fields = self.fields();
        let source_id = self.record_id(record).ok_or_else(|| {
            AppError::InvalidRecord(format!(
                "{} record has no id (expected one of {:?})",
                self.as_str(),
                fields.id
            ))
        })?;

        Ok(SourceRecordMetadata {
            source_id,
            title: first_field(record, fields.title).unwrap_or_default(),
            modified_marker: first_field(record, fields.marker).unwrap_or_default(),
        })
    }

    /// Fields copied onto every chunk of the record.
    pub fn base_metadata(&self, record: &Value) -> AppResult<BaseMetadata> {
        let basic = self.basic_metadata(record)?;
        let fields = self.fields();

        let source = match self {
            Self::Confluence => confluence_link(record),
            _ => first_field(record, fields.source),
        }
        .unwrap_or_default();

        Ok(BaseMetadata {
            name: first_field(record, fields.name).unwrap_or_else(|| basic.title.clone()),
            source,
            created_time: first_field(record, fields.created),
            modified_time: first_field(record, fields.modified),
            source_id: basic.source_id,
            title: basic.title,
            modified_marker: basic.modified_marker,
        })
    }

    /// What the record holds to be chunked.
    pub fn content(&self, record: &Value) -> RecordContent {
        match self {
            Self::File => file_content(record),
            Self::Salesforce => html_from(
                record,
                &["Answer__c", "Body__c", "Description__c", "Summary"],
                "article has no body field",
            ),
            Self::SharePoint => sharepoint_content(record),
            Self::Confluence => html_from(
                record,
                &["body.storage.value", "body.view.value"],
                "page has no storage body",
            ),
            Self::HubSpot => html_from(
                record,
                &["properties.content", "properties.body", "properties.post_body"],
                "object has no content property",
            ),
            Self::RightNow => rightnow_content(record),
            Self::OracleKnowledge => html_from(
                record,
                &["content", "xml", "answer"],
                "content record has no body",
            ),
            Self::Documentation => match first_field(record, &["content", "html"]) {
                Some(html) => RecordContent::Html(html),
                None => match first_field(record, &["text"]) {
                    Some(text) => RecordContent::Text(text),
                    None => unsupported("page has no content"),
                },
            },
        }
    }
}

impl FromStr for SourceKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "file" | "files" => Ok(Self::File),
            "salesforce" => Ok(Self::Salesforce),
            "sharepoint" | "share_point" => Ok(Self::SharePoint),
            "confluence" => Ok(Self::Confluence),
            "hubspot" | "hub_spot" => Ok(Self::HubSpot),
            "rightnow" | "right_now" => Ok(Self::RightNow),
            "oracle_knowledge" | "oracleknowledge" => Ok(Self::OracleKnowledge),
            "documentation" | "docs" => Ok(Self::Documentation),
            _ => Err(AppError::Config(format!(
                "Unknown source type '{}'. Expected one of: {}",
                s,
                SourceKind::ALL.map(|k| k.as_str()).join(", ")
            ))),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn file_content(record: &Value) -> RecordContent {
    let mime_type = first_field(record, &["mime_type", "content_type"]);
    let url = first_field(record, &["url", "path"]);
    let kind = detect_content_kind(mime_type.as_deref(), url.as_deref());

    if let Some(content) = first_field(record, &["content"]) {
        return match kind {
            ContentKind::Html => RecordContent::Html(content),
            _ => RecordContent::Text(content),
        };
    }

    if let Some(video_url) = first_field(record, &["video_url"]).or_else(|| {
        (kind == ContentKind::Video).then(|| url.clone()).flatten()
    }) {
        return match first_field(record, &["description", "transcript"]) {
            Some(description) => RecordContent::Video {
                description,
                video_url,
            },
            None => unsupported("video has no description"),
        };
    }

    match url {
        Some(url) => RecordContent::Download { url, mime_type },
        None => unsupported("file has neither content nor url"),
    }
}

fn sharepoint_content(record: &Value) -> RecordContent {
    if let Some(html) = first_field(record, &["content", "canvasContent"]) {
        return RecordContent::Html(html);
    }

    let mime_type = first_field(record, &["file.mimeType"]);
    let web_url = first_field(record, &["webUrl"]);

    if mime_type.as_deref().is_some_and(|m| m.starts_with("video/")) {
        return match (first_field(record, &["description"]), web_url) {
            (Some(description), Some(video_url)) => RecordContent::Video {
                description,
                video_url,
            },
            _ => unsupported("video has no description"),
        };
    }

    match first_field(record, &["@microsoft.graph.downloadUrl"]).or(web_url) {
        Some(url) => RecordContent::Download { url, mime_type },
        None => unsupported("drive item has no download url"),
    }
}

fn rightnow_content(record: &Value) -> RecordContent {
    let parts: Vec<String> = ["question", "solution"]
        .iter()
        .filter_map(|key| first_field(record, &[*key]))
        .collect();

    if parts.is_empty() {
        return unsupported("answer has no question or solution");
    }
    RecordContent::Html(parts.join("\n"))
}

fn html_from(record: &Value, paths: &[&str], reason: &str) -> RecordContent {
    match first_field(record, paths) {
        Some(html) => RecordContent::Html(html),
        None => unsupported(reason),
    }
}

fn unsupported(reason: &str) -> RecordContent {
    RecordContent::Unsupported {
        reason: reason.to_string(),
    }
}

fn confluence_link(record: &Value) -> Option<String> {
    let webui = lookup(record, "_links.webui").and_then(scalar)?;
    match lookup(record, "_links.base").and_then(scalar) {
        Some(base) => Some(format!("{}{}", base.trim_end_matches('/'), webui)),
        None => Some(webui),
    }
}

/// First present, non-empty scalar among `paths`.
pub(crate) fn first_field(record: &Value, paths: &[&str]) -> Option<String> {
    paths
        .iter()
        .filter_map(|path| lookup(record, path).and_then(scalar))
        .find(|value| !value.is_empty())
}

fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    if let Some(value) = record.get(path) {
        return Some(value);
    }

    path.split('.').try_fold(record, |value, segment| match value {
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => value.get(segment),
    })
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_kinds() {
        for kind in SourceKind::ALL {
            assert_eq!(kind.as_str().parse::<SourceKind>().unwrap(), kind);
        }
        assert_eq!("Share-Point".parse::<SourceKind>().unwrap(), SourceKind::SharePoint);
        assert!(matches!("notion".parse::<SourceKind>(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_confluence_mapping() {
        let page = json!({
            "id": "12345",
            "title": "Release notes",
            "version": {"when": "2024-03-01T10:00:00.000Z", "number": 7},
            "history": {"createdDate": "2023-01-01T00:00:00.000Z"},
            "body": {"storage": {"value": "<p>Fixed bugs</p>"}},
            "_links": {"base": "https://acme.atlassian.net/wiki", "webui": "/spaces/ENG/pages/12345"}
        });

        let kind = SourceKind::Confluence;
        let basic = kind.basic_metadata(&page).unwrap();
        assert_eq!(basic, SourceRecordMetadata::new("12345", "Release notes", "2024-03-01T10:00:00.000Z"));

        let base = kind.base_metadata(&page).unwrap();
        assert_eq!(base.source, "https://acme.atlassian.net/wiki/spaces/ENG/pages/12345");
        assert_eq!(base.created_time.as_deref(), Some("2023-01-01T00:00:00.000Z"));

        assert_eq!(kind.content(&page), RecordContent::Html("<p>Fixed bugs</p>".into()));
    }

    #[test]
    fn test_sharepoint_file_download() {
        let item = json!({
            "id": "01ABC",
            "name": "handbook.pdf",
            "lastModifiedDateTime": "2024-04-02T08:00:00Z",
            "webUrl": "https://acme.sharepoint.com/Shared/handbook.pdf",
            "@microsoft.graph.downloadUrl": "https://download/handbook",
            "file": {"mimeType": "application/pdf"}
        });

        let kind = SourceKind::SharePoint;
        assert_eq!(kind.basic_metadata(&item).unwrap().title, "handbook.pdf");
        assert_eq!(
            kind.content(&item),
            RecordContent::Download {
                url: "https://download/handbook".into(),
                mime_type: Some("application/pdf".into()),
            }
        );
    }

    #[test]
    fn test_sharepoint_video() {
        let item = json!({
            "id": "v1",
            "name": "demo.mp4",
            "webUrl": "https://acme.sharepoint.com/demo.mp4",
            "description": "## [00:00:10] Start\nHello",
            "file": {"mimeType": "video/mp4"}
        });

        assert!(matches!(
            SourceKind::SharePoint.content(&item),
            RecordContent::Video { video_url, .. } if video_url == "https://acme.sharepoint.com/demo.mp4"
        ));
    }

    #[test]
    fn test_salesforce_and_hubspot() {
        let article = json!({
            "Id": "ka0001",
            "Title": "Reset password",
            "LastModifiedDate": "2024-01-05T00:00:00.000+0000",
            "Answer__c": "<p>Click reset.</p>"
        });
        let basic = SourceKind::Salesforce.basic_metadata(&article).unwrap();
        assert_eq!(basic.source_id, "ka0001");
        assert_eq!(basic.modified_marker, "2024-01-05T00:00:00.000+0000");

        let ticket = json!({
            "id": 901,
            "updatedAt": "2024-06-01T00:00:00Z",
            "properties": {"subject": "Login issue", "content": "Cannot log in"}
        });
        let basic = SourceKind::HubSpot.basic_metadata(&ticket).unwrap();
        assert_eq!(basic, SourceRecordMetadata::new("901", "Login issue", "2024-06-01T00:00:00Z"));
        assert_eq!(
            SourceKind::HubSpot.content(&ticket),
            RecordContent::Html("Cannot log in".into())
        );
    }

    #[test]
    fn test_salesforce_source_ignores_api_path() {
        let article = json!({
            "Id": "ka0002",
            "Title": "Billing FAQ",
            "LastModifiedDate": "2024-01-06T00:00:00.000+0000",
            "attributes": {
                "type": "Knowledge__kav",
                "url": "/services/data/v58.0/sobjects/Knowledge__kav/ka0002"
            }
        });
        let base = SourceKind::Salesforce.base_metadata(&article).unwrap();
        assert_eq!(base.source, "");

        let linked = json!({
            "Id": "ka0003",
            "Title": "Refunds",
            "LastModifiedDate": "2024-01-07T00:00:00.000+0000",
            "url": "https://acme.my.site.com/s/article/refunds",
            "attributes": {"url": "/services/data/v58.0/sobjects/Knowledge__kav/ka0003"}
        });
        let base = SourceKind::Salesforce.base_metadata(&linked).unwrap();
        assert_eq!(base.source, "https://acme.my.site.com/s/article/refunds");
    }

    #[test]
    fn test_rightnow_joins_question_and_solution() {
        let answer = json!({
            "id": 44,
            "summary": "Shipping times",
            "updatedTime": "2024-02-02T00:00:00Z",
            "question": "<p>How long?</p>",
            "solution": "<p>Three days.</p>",
            "links": [{"href": "https://acme.custhelp.com/app/answers/detail/a_id/44"}]
        });

        let kind = SourceKind::RightNow;
        assert_eq!(
            kind.content(&answer),
            RecordContent::Html("<p>How long?</p>\n<p>Three days.</p>".into())
        );
        assert_eq!(
            kind.base_metadata(&answer).unwrap().source,
            "https://acme.custhelp.com/app/answers/detail/a_id/44"
        );
    }

    #[test]
    fn test_documentation_marker_always_empty() {
        let page = json!({
            "url": "https://docs.acme.com/start",
            "title": "Getting started",
            "content": "<h1>Start</h1>",
            "modified_time": "2024-01-01"
        });

        let basic = SourceKind::Documentation.basic_metadata(&page).unwrap();
        assert_eq!(basic.source_id, "https://docs.acme.com/start");
        assert_eq!(basic.modified_marker, "");
    }

    #[test]
    fn test_oracle_knowledge_mapping() {
        let record = json!({
            "recordId": "KA-77",
            "title": "Warranty",
            "dateModified": "2024-07-07",
            "content": "<p>One year.</p>"
        });
        let basic = SourceKind::OracleKnowledge.basic_metadata(&record).unwrap();
        assert_eq!(basic, SourceRecordMetadata::new("KA-77", "Warranty", "2024-07-07"));
    }

    #[test]
    fn test_missing_id_is_invalid() {
        let record = json!({"title": "No id"});
        for kind in SourceKind::ALL {
            assert!(matches!(
                kind.basic_metadata(&record),
                Err(AppError::InvalidRecord(_))
            ));
        }
    }

    #[test]
    fn test_file_content_variants() {
        let inline = json!({"id": "n1", "content": "plain notes", "mime_type": "text/plain"});
        assert_eq!(SourceKind::File.content(&inline), RecordContent::Text("plain notes".into()));

        let remote = json!({"id": "f1", "url": "https://files/a.pdf"});
        assert!(matches!(SourceKind::File.content(&remote), RecordContent::Download { .. }));

        let video = json!({"id": "v1", "url": "https://youtu.be/abc", "video_url": "https://youtu.be/abc", "description": "Intro"});
        assert!(matches!(SourceKind::File.content(&video), RecordContent::Video { .. }));

        let empty = json!({"id": "e1"});
        assert!(matches!(SourceKind::File.content(&empty), RecordContent::Unsupported { .. }));
    }

    #[test]
    fn test_lookup_paths() {
        let record = json!({"a": {"b": [{"c": "deep"}]}, "x.y": "dotted"});
        assert_eq!(first_field(&record, &["a.b.0.c"]).as_deref(), Some("deep"));
        assert_eq!(first_field(&record, &["x.y"]).as_deref(), Some("dotted"));
        assert_eq!(first_field(&record, &["missing", "a.b.0.c"]).as_deref(), Some("deep"));
        assert_eq!(first_field(&json!({"e": ""}), &["e"]), None);
    }
}
