//! Virtual-host and context routing tables ([spec §4.9]).

use std::collections::HashMap;

use crate::http::Method;

/// A path prefix registered on a [`VirtualHost`], with a handler per HTTP method.
///
/// `path` excludes any trailing slash; the catch-all context (returned when no
/// registered path is an ancestor of the requested one) has no handlers and an empty
/// `path`.
#[derive(Debug, Default)]
pub struct ContextInfo {
    path: String,
    methods: HashMap<Method, usize>,
}

impl ContextInfo {
    fn new(path: String) -> Self {
        Self { path, methods: HashMap::new() }
    }

    /// The registered path prefix, without a trailing slash. Empty for the catch-all
    /// context.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The handler index registered for `method`, if any. Handlers themselves live in
    /// the owning [`crate::dispatch`] handler table, indexed by this value.
    #[inline]
    pub fn handler(&self, method: Method) -> Option<usize> {
        self.methods.get(&method).copied()
    }

    /// Every method this context has a handler for, in no particular order.
    pub fn methods(&self) -> impl Iterator<Item = Method> + '_ {
        self.methods.keys().copied()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// A named (or default) routing namespace, matched by the request's `Host` header or
/// URI authority, including aliases ([spec §4.9]).
#[derive(Debug)]
pub struct VirtualHost {
    name: Option<String>,
    contexts: HashMap<String, ContextInfo>,
    all_methods: HashMap<Method, ()>,
    directory_index: Option<String>,
    allow_generated_index: bool,
}

impl VirtualHost {
    /// A host with no contexts yet, `index.html` as its directory index, and no
    /// generated directory listing.
    pub fn new(name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_owned),
            contexts: HashMap::new(),
            all_methods: HashMap::new(),
            directory_index: Some("index.html".to_string()),
            allow_generated_index: false,
        }
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn directory_index(&self) -> Option<&str> {
        self.directory_index.as_deref()
    }

    pub fn set_directory_index(&mut self, index: Option<&str>) {
        self.directory_index = index.map(str::to_owned);
    }

    #[inline]
    pub fn allow_generated_index(&self) -> bool {
        self.allow_generated_index
    }

    pub fn set_allow_generated_index(&mut self, allow: bool) {
        self.allow_generated_index = allow;
    }

    /// Register a handler (identified by `handler_index`, owned by the caller's
    /// handler table) for `method` at `path`. Recording `method` into the host's
    /// all-methods set is what makes `OPTIONS *` and 405-vs-501 work ([spec §4.9]).
    pub fn add_context(&mut self, path: &str, method: Method, handler_index: usize) {
        let path = trim_trailing_slash(path);
        let ctx = self.contexts.entry(path.to_string()).or_insert_with(|| ContextInfo::new(path.to_string()));
        ctx.methods.insert(method, handler_index);
        self.all_methods.insert(method, ());
    }

    /// Every method supported by *any* context on this host — used for the
    /// server-wide `OPTIONS *` response ([spec §4.9]/[spec §4.10]).
    pub fn supported_methods(&self) -> impl Iterator<Item = Method> + '_ {
        self.all_methods.keys().copied()
    }

    /// Walk ancestor paths of `path`, stripping the last `/`-segment until a
    /// registered context is found, or the path becomes the root ([spec §4.9]). A
    /// single walk — never re-enters the parent chain for each candidate.
    pub fn get_context(&self, path: &str) -> &ContextInfo {
        let mut candidate = trim_trailing_slash(path);
        loop {
            if let Some(ctx) = self.contexts.get(candidate) {
                return ctx;
            }
            if candidate.is_empty() {
                return empty_context();
            }
            candidate = match candidate.rfind('/') {
                Some(0) => "",
                Some(i) => &candidate[..i],
                None => "",
            };
        }
    }
}

fn trim_trailing_slash(path: &str) -> &str {
    if path == "/" {
        return path;
    }
    path.strip_suffix('/').unwrap_or(path)
}

/// The catch-all context returned when no registered path is an ancestor of the
/// requested one.
fn empty_context() -> &'static ContextInfo {
    static EMPTY: std::sync::OnceLock<ContextInfo> = std::sync::OnceLock::new();
    EMPTY.get_or_init(|| ContextInfo::new(String::new()))
}

/// Maps a `Host` header value (or URI authority) to its [`VirtualHost`], including
/// aliases; `""` is the default host used when no name matches ([spec §4.9]).
#[derive(Debug, Default)]
pub struct HostTable {
    hosts: HashMap<String, VirtualHost>,
    /// Alias name → canonical key into `hosts`, so alias lookups see every context
    /// added to the canonical host after registration, not a point-in-time snapshot.
    aliases: HashMap<String, String>,
}

impl HostTable {
    pub fn new() -> Self {
        Self { hosts: HashMap::new(), aliases: HashMap::new() }
    }

    /// Register `host` under its own name (or `""` if unnamed) and every alias.
    pub fn insert(&mut self, host: VirtualHost, aliases: &[&str]) -> &mut VirtualHost {
        let key = host.name().unwrap_or("").to_string();
        for alias in aliases {
            self.aliases.insert(alias.to_string(), key.clone());
        }
        self.hosts.insert(key.clone(), host);
        self.hosts.get_mut(&key).expect("just inserted")
    }

    /// Resolve a request's `Host` header (port already stripped) to its
    /// [`VirtualHost`], falling back to the default (`""`) host.
    pub fn resolve(&self, host: &str) -> Option<&VirtualHost> {
        if let Some(vh) = self.hosts.get(host) {
            return Some(vh);
        }
        if let Some(canonical) = self.aliases.get(host) {
            return self.hosts.get(canonical);
        }
        self.hosts.get("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_context_finds_exact_match() {
        let mut host = VirtualHost::new(None);
        host.add_context("/a/b", Method::GET, 0);
        assert_eq!(host.get_context("/a/b").path(), "/a/b");
    }

    #[test]
    fn get_context_walks_ancestors() {
        let mut host = VirtualHost::new(None);
        host.add_context("/a", Method::GET, 0);
        assert_eq!(host.get_context("/a/b/c").path(), "/a");
    }

    #[test]
    fn get_context_falls_back_to_empty_context() {
        let host = VirtualHost::new(None);
        assert!(host.get_context("/nothing/here").is_empty());
    }

    #[test]
    fn get_context_never_skips_to_a_non_ancestor() {
        let mut host = VirtualHost::new(None);
        host.add_context("/a/b", Method::GET, 0);
        host.add_context("/x", Method::GET, 1);
        // "/a/c" shares no ancestor with "/a/b" or "/x" other than root.
        assert!(host.get_context("/a/c").is_empty());
    }

    #[test]
    fn supported_methods_aggregate_across_contexts() {
        let mut host = VirtualHost::new(None);
        host.add_context("/a", Method::GET, 0);
        host.add_context("/b", Method::POST, 1);
        let methods: Vec<_> = host.supported_methods().collect();
        assert!(methods.contains(&Method::GET));
        assert!(methods.contains(&Method::POST));
    }

    #[test]
    fn host_table_resolves_aliases_to_equivalent_hosts() {
        let mut table = HostTable::new();
        let host = VirtualHost::new(Some("example.com"));
        table.insert(host, &["www.example.com"]);
        assert!(table.resolve("example.com").is_some());
        assert!(table.resolve("www.example.com").is_some());
    }

    #[test]
    fn host_table_falls_back_to_default() {
        let mut table = HostTable::new();
        table.insert(VirtualHost::new(None), &[]);
        assert_eq!(table.resolve("unknown.example").unwrap().name(), None);
    }
}
