use std::fmt;
use url::form_urlencoded;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Input,
    Results,
    Analysis,
    FileDetails,
}

impl Page {
    pub fn path(self) -> &'static str {
        match self {
            Self::Input => "/",
            Self::Results => "/results",
            Self::Analysis => "/analysis",
            Self::FileDetails => "/file-details",
        }
    }

    fn from_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "" => Some(Self::Input),
            "/results" | "results" => Some(Self::Results),
            "/analysis" | "analysis" => Some(Self::Analysis),
            "/file-details" | "file-details" => Some(Self::FileDetails),
            _ => None,
        }
    }
}

/// A view reached without its required parameters resolves to `Input`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Input,
    Results { repo: String, branch: String },
    Analysis { repo: String, branch: String },
    FileDetails { repo: String, branch: String, file: String },
}

impl Route {
    /// Resolves `query` for `page`, falling back to [`Route::Input`] when a
    /// required parameter is missing.
    pub fn resolve(page: Page, query: &str) -> Self {
        let params = Params::parse(query);
        let Some(repo) = params.repo else {
            return Self::Input;
        };
        let branch = params.branch.unwrap_or_default();
        match page {
            Page::Input => Self::Input,
            Page::Results => Self::Results { repo, branch },
            Page::Analysis => Self::Analysis { repo, branch },
            Page::FileDetails => match params.file {
                Some(file) => Self::FileDetails { repo, branch, file },
                None => Self::Input,
            },
        }
    }

    /// Parses a full link such as `/analysis?repo=...`. Unknown paths route to input.
    pub fn from_link(link: &str) -> Self {
        let (path, query) = link.split_once('?').unwrap_or((link, ""));
        let path = strip_origin(path);
        match Page::from_path(path) {
            Some(page) => Self::resolve(page, query),
            None => Self::Input,
        }
    }

    pub fn page(&self) -> Page {
        match self {
            Self::Input => Page::Input,
            Self::Results { .. } => Page::Results,
            Self::Analysis { .. } => Page::Analysis,
            Self::FileDetails { .. } => Page::FileDetails,
        }
    }

    pub fn to_link(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        match self {
            Self::Input => return Page::Input.path().to_string(),
            Self::Results { repo, branch } | Self::Analysis { repo, branch } => {
                query.append_pair("repo", repo).append_pair("branch", branch);
            }
            Self::FileDetails { repo, branch, file } => {
                query
                    .append_pair("repo", repo)
                    .append_pair("branch", branch)
                    .append_pair("file", file);
            }
        }
        format!("{}?{}", self.page().path(), query.finish())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_link())
    }
}

#[derive(Debug, Default)]
struct Params {
    repo: Option<String>,
    branch: Option<String>,
    file: Option<String>,
}

impl Params {
    fn parse(query: &str) -> Self {
        let mut params = Self::default();
        let query = query.trim_start_matches('?');
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.into_owned();
            match key.as_ref() {
                "repo" => params.repo = Some(value).filter(|v| !v.trim().is_empty()),
                "branch" => params.branch = Some(value),
                "file" => params.file = Some(value).filter(|v| !v.trim().is_empty()),
                _ => {}
            }
        }
        params
    }
}

fn strip_origin(path: &str) -> &str {
    match path.find("://") {
        Some(scheme_end) => {
            let rest = &path[scheme_end + 3..];
            rest.find('/').map_or("", |slash| &rest[slash..])
        }
        None => path,
    }
}
