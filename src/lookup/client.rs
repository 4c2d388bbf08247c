use crate::config::LookupConfig;
use crate::lookup::types::{LookupError, Summary};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// 摘要查询接口
#[async_trait]
pub trait SummaryLookup: Send + Sync {
    async fn summary(&self, query: &str) -> Result<Summary, LookupError>;
}

/// MediaWiki API 客户端
///
/// 查询分三步：全文搜索（含拼写建议）确定标题，读取页面属性判断
/// 是否存在及是否为消歧义页，最后取导言部分的纯文本摘录。
pub struct WikipediaClient {
    http: reqwest::Client,
    endpoint: String,
}

impl WikipediaClient {
    pub fn new(config: &LookupConfig) -> Result<Self, LookupError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    async fn query<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T, LookupError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("action", "query"), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .await?
            .error_for_status()?;

        let body: ApiResponse<T> = response.json().await?;
        body.into_result()
    }

    async fn resolve_title(&self, query: &str) -> Result<String, LookupError> {
        let search: SearchQuery = self
            .query(&[
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", "1"),
                ("srinfo", "suggestion"),
                ("srprop", ""),
            ])
            .await?;
        search.best_title(query)
    }

    async fn page_title(&self, title: &str) -> Result<String, LookupError> {
        let pages: PagesQuery = self
            .query(&[
                ("prop", "info|pageprops"),
                ("ppprop", "disambiguation"),
                ("redirects", "1"),
                ("titles", title),
            ])
            .await?;
        pages.existing_title(title)
    }

    async fn extract(&self, title: &str) -> Result<String, LookupError> {
        let pages: PagesQuery = self
            .query(&[
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
            ])
            .await?;
        pages.extract(title)
    }
}

#[async_trait]
impl SummaryLookup for WikipediaClient {
    async fn summary(&self, query: &str) -> Result<Summary, LookupError> {
        let candidate = self.resolve_title(query).await?;
        let title = self.page_title(&candidate).await?;
        let text = self.extract(&title).await?;

        tracing::debug!("Lookup '{}' resolved to '{}' ({} chars)", query, title, text.len());
        Ok(Summary { title, text })
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    query: Option<T>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    #[serde(default)]
    info: String,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, LookupError> {
        if let Some(error) = self.error {
            return Err(LookupError::Service(format!("{}: {}", error.code, error.info)));
        }
        self.query
            .ok_or_else(|| LookupError::Service("response has no 'query' section".to_string()))
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    searchinfo: Option<SearchInfo>,
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchInfo {
    #[serde(default)]
    suggestion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

impl SearchQuery {
    /// 优先使用拼写建议，其次第一条结果
    fn best_title(self, query: &str) -> Result<String, LookupError> {
        let suggestion = self
            .searchinfo
            .and_then(|info| info.suggestion)
            .filter(|s| !s.trim().is_empty());

        suggestion
            .or_else(|| self.search.into_iter().next().map(|hit| hit.title))
            .ok_or_else(|| LookupError::NotFound(query.to_string()))
    }
}

#[derive(Debug, Default, Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    pageprops: Option<PageProps>,
    #[serde(default)]
    extract: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    #[serde(default)]
    disambiguation: Option<serde_json::Value>,
}

impl PagesQuery {
    fn first(self, title: &str) -> Result<Page, LookupError> {
        match self.pages.into_iter().next() {
            Some(page) if !page.missing && !page.invalid => Ok(page),
            _ => Err(LookupError::NotFound(title.to_string())),
        }
    }

    fn existing_title(self, title: &str) -> Result<String, LookupError> {
        let page = self.first(title)?;
        let disambiguation = page
            .pageprops
            .as_ref()
            .is_some_and(|props| props.disambiguation.is_some());

        if disambiguation {
            return Err(LookupError::Ambiguous(page.title));
        }
        Ok(page.title)
    }

    fn extract(self, title: &str) -> Result<String, LookupError> {
        let page = self.first(title)?;
        Ok(page.extract.unwrap_or_default().trim().to_string())
    }
}
