//! Static route table and URL pattern matching
//!
//! # Pattern syntax
//!
//! Patterns are matched byte by byte against the decoded URL path:
//!
//! | Pattern   | Matches                  | Does not match |
//! |-----------|--------------------------|----------------|
//! | `/a\|`    | `/a`                     | `/a/`, `/ab`   |
//! | `/a\\`    | `/a`, `/a/`              | `/a/b`, `/ab`  |
//! | `/a`      | `/a`, `/a/`, `/a/b`      | `/ab`          |
//!
//! `|` ends the URL hard, `\` allows one trailing `/`. Without a terminator
//! the URL has to continue with `/` or end. Whatever follows the consumed
//! pattern is the request [tail](crate::Request::tail).

use crate::{errors::ErrorKind, Method, Methods, Request};

/// Handler invoked for a matched route.
///
/// Implemented for every `Fn(&mut Request<'_>)`, so plain functions can be
/// placed in a route table.
///
/// # Examples
///
/// ```
/// use octet_http::{Handler, Request, StatusCode};
///
/// struct Teapot;
///
/// impl Handler for Teapot {
///     fn handle(&self, req: &mut Request<'_>) {
///         req.set_status(StatusCode(418));
///         let _ = req.write(b"short and stout");
///     }
/// }
/// ```
pub trait Handler: Sync + Send + 'static {
    /// Serves the request. The status is preset to `200` and headers are
    /// sent on return if the handler did not write anything.
    fn handle(&self, req: &mut Request<'_>);
}

impl<F> Handler for F
where
    F: Fn(&mut Request<'_>) + Sync + Send + 'static,
{
    #[inline]
    fn handle(&self, req: &mut Request<'_>) {
        self(req)
    }
}

/// Declared type of a query variable.
///
/// Only variable names are recognized, values are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Undefined,
    Integer,
    Real,
    Boolean,
    Text,
}

/// A query variable a route understands
#[derive(Debug, Clone, Copy)]
pub struct VarSpec {
    pub name: &'static str,
    pub kind: VarType,
    /// Longest value the variable may carry
    pub max_len: usize,
}

impl VarSpec {
    #[inline]
    pub const fn new(name: &'static str, kind: VarType, max_len: usize) -> Self {
        VarSpec {
            name,
            kind,
            max_len,
        }
    }
}

/// Entry of the route table.
///
/// # Examples
///
/// ```
/// use octet_http::{Methods, Request, Route, VarSpec, VarType};
///
/// fn echo(req: &mut Request<'_>) {
///     let tail = req.tail().unwrap_or(b"");
///     let mut copy = [0; 16];
///     copy[..tail.len()].copy_from_slice(tail);
///     let _ = req.write(&copy[..tail.len()]);
/// }
///
/// static ECHO_VARS: [VarSpec; 1] = [VarSpec::new("upper", VarType::Boolean, 1)];
///
/// static ECHO: Route = Route::new("/echo", &echo)
///     .tail(16)
///     .methods(Methods::GET.or(Methods::HEAD))
///     .vars(&ECHO_VARS);
/// ```
pub struct Route {
    pub(crate) pattern: &'static str,
    pub(crate) vars: &'static [VarSpec],
    pub(crate) handler: &'static dyn Handler,
    pub(crate) max_tail: usize,
    pub(crate) methods: Methods,
}

impl Route {
    /// Route accepting `GET` and `HEAD` without a tail or variables.
    #[inline]
    pub const fn new(pattern: &'static str, handler: &'static dyn Handler) -> Self {
        Route {
            pattern,
            vars: &[],
            handler,
            max_tail: 0,
            methods: Methods::GET.or(Methods::HEAD),
        }
    }

    /// Longest tail accepted after the pattern.
    #[inline]
    pub const fn tail(mut self, max_tail: usize) -> Self {
        self.max_tail = max_tail;
        self
    }

    #[inline]
    pub const fn methods(mut self, methods: Methods) -> Self {
        self.methods = methods;
        self
    }

    #[inline]
    pub const fn vars(mut self, vars: &'static [VarSpec]) -> Self {
        self.vars = vars;
        self
    }

    #[inline]
    pub const fn pattern(&self) -> &'static str {
        self.pattern
    }

    #[inline]
    pub const fn allowed_methods(&self) -> Methods {
        self.methods
    }

    #[inline]
    pub const fn var_specs(&self) -> &'static [VarSpec] {
        self.vars
    }

    /// Index of the declared variable called `name`.
    pub(crate) fn var_index(&self, name: &[u8]) -> Option<usize> {
        self.vars.iter().position(|var| var.name.as_bytes() == name)
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("vars", &self.vars)
            .field("max_tail", &self.max_tail)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

/// Ordered route table, the first route whose pattern matches wins.
///
/// Buffer capacities are derived from the table at compile time:
/// the URL buffer holds the longest `pattern + tail`, the query scratch the
/// longest declared variable name.
#[derive(Debug)]
pub struct Router {
    routes: &'static [Route],
    url_size: usize,
    var_name_size: usize,
}

impl Router {
    pub const fn new(routes: &'static [Route]) -> Self {
        let mut url_size = 0;
        let mut var_name_size = 0;

        let mut i = 0;
        while i < routes.len() {
            let route = &routes[i];
            let len = route.pattern.len() + route.max_tail;
            if len > url_size {
                url_size = len;
            }

            let mut j = 0;
            while j < route.vars.len() {
                if route.vars[j].name.len() > var_name_size {
                    var_name_size = route.vars[j].name.len();
                }
                j += 1;
            }
            i += 1;
        }

        Router {
            routes,
            url_size,
            var_name_size,
        }
    }

    #[inline]
    pub const fn routes(&self) -> &'static [Route] {
        self.routes
    }

    /// Longest URL path accepted, longer paths are answered with `414`.
    #[inline]
    pub const fn url_size(&self) -> usize {
        self.url_size
    }

    /// Longest query variable name declared by any route.
    #[inline]
    pub const fn var_name_size(&self) -> usize {
        self.var_name_size
    }

    /// Finds the route for `url`, returns it with the tail offset.
    ///
    /// A matching path is authoritative: if its route does not allow
    /// `method` the search stops with `405`.
    pub(crate) fn find(
        &self,
        url: &[u8],
        method: Method,
    ) -> Result<(&'static Route, Option<usize>), ErrorKind> {
        let routes = self.routes;

        for route in routes {
            let Some(end) = match_url(route.pattern.as_bytes(), url) else {
                continue;
            };
            if !route.methods.contains(method) {
                return Err(ErrorKind::MethodNotAllowed);
            }

            let tail = (end < url.len()).then_some(end);
            return Ok((route, tail));
        }

        Err(ErrorKind::NotFound)
    }
}

/// Matches `url` against `pattern`, returns the offset just past the
/// consumed pattern.
pub(crate) fn match_url(pattern: &[u8], url: &[u8]) -> Option<usize> {
    let mut j = 0;

    for &p in pattern {
        match p {
            b'|' => return (j == url.len()).then_some(j),
            b'\\' => {
                return match &url[j..] {
                    [] | [b'/'] => Some(j),
                    _ => None,
                }
            }
            _ if url.get(j) == Some(&p) => j += 1,
            _ => return None,
        }
    }

    match url.get(j) {
        None | Some(b'/') => Some(j),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nop(_: &mut Request<'_>) {}

    #[test]
    fn patterns() {
        #[rustfmt::skip]
        let cases = [
            ("/a|",  "/a",    Some(2)),
            ("/a|",  "/a/",   None),
            ("/a|",  "/ab",   None),
            ("/a|",  "/",     None),

            ("/a\\", "/a",    Some(2)),
            ("/a\\", "/a/",   Some(2)),
            ("/a\\", "/a/b",  None),
            ("/a\\", "/ab",   None),

            ("/a",   "/a",    Some(2)),
            ("/a",   "/a/",   Some(2)),
            ("/a",   "/a/b",  Some(2)),
            ("/a",   "/ab",   None),
            ("/a",   "/",     None),

            ("/",    "/",     Some(1)),
            ("/",    "/x",    None),
            ("/|",   "/",     Some(1)),
            ("/|",   "/x",    None),
        ];

        for (pattern, url, expected) in cases {
            assert_eq!(
                match_url(pattern.as_bytes(), url.as_bytes()),
                expected,
                "{pattern:?} vs {url:?}"
            );
        }
    }

    static TEST_VARS: [VarSpec; 2] = [
        VarSpec::new("q", VarType::Text, 8),
        VarSpec::new("verbose", VarType::Boolean, 1),
    ];
    static ROUTES: [Route; 4] = [
        Route::new("/favicon.ico|", &nop),
        Route::new("/test", &nop).tail(16).vars(&TEST_VARS),
        Route::new("/upload|", &nop).methods(Methods::POST),
        Route::new("/|", &nop).methods(Methods::ALL),
    ];
    static ROUTER: Router = Router::new(&ROUTES);

    #[test]
    fn sizes() {
        assert_eq!(ROUTER.url_size(), "/test".len() + 16);
        assert_eq!(ROUTER.var_name_size(), "verbose".len());
    }

    #[test]
    fn find() {
        #[rustfmt::skip]
        let cases = [
            ("/favicon.ico", Method::Get,  Ok(("/favicon.ico|", None))),
            ("/test",        Method::Head, Ok(("/test", None))),
            ("/test/abc",    Method::Get,  Ok(("/test", Some(5)))),
            ("/upload",      Method::Post, Ok(("/upload|", None))),
            ("/",            Method::Post, Ok(("/|", None))),

            ("/upload",      Method::Get,  Err(ErrorKind::MethodNotAllowed)),
            ("/test",        Method::Post, Err(ErrorKind::MethodNotAllowed)),
            ("/testing",     Method::Get,  Err(ErrorKind::NotFound)),
            ("/nothing",     Method::Get,  Err(ErrorKind::NotFound)),
        ];

        for (url, method, expected) in cases {
            let result = ROUTER
                .find(url.as_bytes(), method)
                .map(|(route, tail)| (route.pattern(), tail));
            assert_eq!(result, expected, "{url}");
        }
    }

    #[test]
    fn var_lookup() {
        let route = &ROUTES[1];

        assert_eq!(route.var_index(b"q"), Some(0));
        assert_eq!(route.var_index(b"verbose"), Some(1));
        assert_eq!(route.var_index(b"v"), None);
    }
}
