//! Convenience macros for plugin development.

/// Macro for creating a plugin manifest.
///
/// # Example
/// ```rust,ignore
/// let manifest = manifest!(
///     name: "watermark",
///     version: "1.0.0",
///     main: "libwatermark.so"
/// );
/// ```
#[macro_export]
macro_rules! manifest {
    (
        name: $name:expr,
        version: $version:expr,
        main: $main:expr $(,)?
    ) => {
        $crate::manifest::PluginManifest::new($name, $version, $main)
    };
    (
        name: $name:expr,
        version: $version:expr,
        main: $main:expr,
        description: $desc:expr $(,)?
    ) => {{
        let mut m = $crate::manifest::PluginManifest::new($name, $version, $main);
        m.description = Some($desc.to_string());
        m
    }};
    (
        name: $name:expr,
        version: $version:expr,
        main: $main:expr,
        description: $desc:expr,
        author: $author:expr $(,)?
    ) => {{
        let mut m = $crate::manifest::PluginManifest::new($name, $version, $main);
        m.description = Some($desc.to_string());
        m.author = Some($author.to_string());
        m
    }};
}
