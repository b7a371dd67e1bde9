use std::fmt;

/// A fully-qualified remote method, `/<package>.<Service>/<Method>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodName<'a> {
    package: &'a str,
    service: &'a str,
    method: &'a str,
}

impl<'a> MethodName<'a> {
    /// Parses a request path. Returns `None` for anything that is not exactly
    /// one non-empty service segment followed by one non-empty method segment.
    pub fn parse(path: &'a str) -> Option<Self> {
        let (qualified, method) = path.strip_prefix('/')?.split_once('/')?;
        let (package, service) = qualified.rsplit_once('.')?;

        if package.is_empty() || service.is_empty() || method.is_empty() || method.contains('/')
        {
            return None;
        }

        Some(Self {
            package,
            service,
            method,
        })
    }

    #[inline]
    pub fn package(&self) -> &'a str {
        self.package
    }

    #[inline]
    pub fn service(&self) -> &'a str {
        self.service
    }

    #[inline]
    pub fn method(&self) -> &'a str {
        self.method
    }

    /// Returns the authorization lookup key, `<Service>/<Method>`.
    pub fn route(&self) -> String {
        format!("{}/{}", self.service, self.method)
    }
}

impl fmt::Display for MethodName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}.{}/{}", self.package, self.service, self.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_qualified_method() {
        let name = MethodName::parse("/proto.UserService/ListUsers");
        let name = name.expect("valid method name");
        assert_eq!(name.package(), "proto");
        assert_eq!(name.service(), "UserService");
        assert_eq!(name.method(), "ListUsers");
        assert_eq!(name.route(), "UserService/ListUsers");
        assert_eq!(name.to_string(), "/proto.UserService/ListUsers");
    }

    #[test]
    fn nested_packages_keep_the_last_segment_as_service() {
        let name = MethodName::parse("/acme.auth.v1.AuthService/Login");
        assert_eq!(name.map(|n| n.route()).as_deref(), Some("AuthService/Login"));
    }

    #[test]
    fn rejects_malformed_paths() {
        for path in [
            "",
            "/",
            "UserService/ListUsers",
            "/UserService/ListUsers",
            "/proto.UserService/",
            "/proto./ListUsers",
            "/.UserService/ListUsers",
            "/proto.UserService/List/Users",
        ] {
            assert_eq!(MethodName::parse(path), None, "{path}");
        }
    }
}
