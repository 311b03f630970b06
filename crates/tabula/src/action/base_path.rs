use tabula_core::RouteContext;

use url::Url;

/// Trailing path segments that name a page rather than the resource.
const PAGE_SEGMENTS: [&str; 4] = ["index", "create", "edit", "show"];

/// Resolves the path action hrefs are built on.
///
/// Sources are tried in order, each only when the previous one yields
/// nothing: the referrer path, the matched route URI, the route name without
/// its last dot-segment, and the raw request path.
pub fn resolve(route: &RouteContext) -> Option<String> {
    let from_referrer = || {
        route
            .referrer
            .as_deref()
            .and_then(referrer_path)
            .as_deref()
            .and_then(strip)
    };
    let from_uri = || route.route_uri.as_deref().and_then(strip);
    let from_name = || route.route_name.as_deref().and_then(route_name_path);
    let from_path = || route.request_path.as_deref().and_then(strip);

    let resolved = from_referrer()
        .or_else(from_uri)
        .or_else(from_name)
        .or_else(from_path);

    if resolved.is_none() {
        tracing::debug!(?route, "no base path resolved for action buttons");
    }

    resolved
}

fn referrer_path(referrer: &str) -> Option<String> {
    match Url::parse(referrer) {
        Ok(url) => Some(url.path().to_string()),
        // Relative referrers carry the path directly.
        Err(_) => referrer
            .split(['?', '#'])
            .next()
            .map(str::to_string),
    }
}

/// `admin.users.index` becomes `/admin/users`.
fn route_name_path(name: &str) -> Option<String> {
    let (prefix, _) = name.trim().rsplit_once('.')?;
    if prefix.is_empty() {
        return None;
    }
    Some(format!("/{}", prefix.replace('.', "/")))
}

/// Normalizes `path` to a leading-slash form and removes trailing page
/// segments. Returns `None` when nothing is left.
pub fn strip(path: &str) -> Option<String> {
    let mut segments: Vec<&str> = path
        .trim()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    while segments
        .last()
        .is_some_and(|last| PAGE_SEGMENTS.contains(last))
    {
        segments.pop();
    }

    if segments.is_empty() {
        return None;
    }

    Some(format!("/{}", segments.join("/")))
}
