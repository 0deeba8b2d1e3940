//! Trigger matching over the registered plugins.

use std::sync::Arc;

use super::contract::Plugin;

/// Result of matching an input against the registry.
#[derive(Clone)]
pub enum TriggerMatch {
    PluginMatch {
        plugin: Arc<dyn Plugin>,
        args: Vec<String>,
    },
    NoMatch,
}

impl TriggerMatch {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::PluginMatch { .. })
    }

    pub fn plugin_name(&self) -> Option<&str> {
        match self {
            Self::PluginMatch { plugin, .. } => Some(plugin.name()),
            Self::NoMatch => None,
        }
    }
}

impl std::fmt::Debug for TriggerMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PluginMatch { plugin, args } => f
                .debug_struct("PluginMatch")
                .field("plugin", &plugin.name())
                .field("args", args)
                .finish(),
            Self::NoMatch => write!(f, "NoMatch"),
        }
    }
}

/// Ordered plugin roster. Registration order is the tie-break between patterns.
#[derive(Default, Clone)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a plugin at the lowest precedence.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    pub fn with(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.register(plugin);
        self
    }

    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Arc<dyn Plugin>> {
        self.plugins.iter().find(|plugin| plugin.name() == name)
    }

    /// Finds the first plugin whose trigger matches `text` and extracts its arguments.
    ///
    /// Each capture group is trimmed; groups that did not participate or are empty
    /// after trimming are dropped.
    pub fn find_plugin_for_message(&self, text: &str) -> TriggerMatch {
        for plugin in &self.plugins {
            if let Some(captures) = plugin.trigger().captures(text) {
                let args = captures
                    .iter()
                    .skip(1)
                    .flatten()
                    .map(|group| group.as_str().trim().to_string())
                    .filter(|arg| !arg.is_empty())
                    .collect();
                return TriggerMatch::PluginMatch {
                    plugin: Arc::clone(plugin),
                    args,
                };
            }
        }
        TriggerMatch::NoMatch
    }

    /// `(name, description)` for each plugin, in registration order.
    pub fn help_entries(&self) -> Vec<(String, String)> {
        self.plugins
            .iter()
            .map(|plugin| (plugin.name().to_string(), plugin.description().to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::PluginResult;
    use async_trait::async_trait;
    use regex::Regex;

    struct PatternPlugin {
        name: &'static str,
        trigger: Regex,
    }

    impl PatternPlugin {
        fn new(name: &'static str, pattern: &str) -> Arc<dyn Plugin> {
            Arc::new(Self {
                name,
                trigger: Regex::new(pattern).unwrap(),
            })
        }
    }

    #[async_trait]
    impl Plugin for PatternPlugin {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "test plugin"
        }

        fn trigger(&self) -> &Regex {
            &self.trigger
        }

        async fn execute(&self, _args: &[String]) -> anyhow::Result<PluginResult> {
            Ok(PluginResult::text(self.name))
        }
    }

    fn registry() -> PluginRegistry {
        PluginRegistry::new()
            .with(PatternPlugin::new("weather", r"(?i)^/weather\s+(.+)"))
            .with(PatternPlugin::new("calc", r"(?i)^/calc\s+(.+)"))
            .with(PatternPlugin::new("define", r"(?i)^/define\s+(.+)"))
    }

    #[test]
    fn test_first_registered_match_wins() {
        let broad = PatternPlugin::new("anything", r"^/(.*)");
        let calc = PatternPlugin::new("calc", r"(?i)^/calc\s+(.+)");

        let calc_first = PluginRegistry::new().with(calc.clone()).with(broad.clone());
        assert_eq!(
            calc_first.find_plugin_for_message("/calc 1+1").plugin_name(),
            Some("calc")
        );

        let broad_first = PluginRegistry::new().with(broad).with(calc);
        assert_eq!(
            broad_first.find_plugin_for_message("/calc 1+1").plugin_name(),
            Some("anything")
        );
    }

    #[test]
    fn test_arguments_are_trimmed() {
        match registry().find_plugin_for_message("/calc  2+2  ") {
            TriggerMatch::PluginMatch { plugin, args } => {
                assert_eq!(plugin.name(), "calc");
                assert_eq!(args, vec!["2+2".to_string()]);
            }
            TriggerMatch::NoMatch => panic!("expected calc to match"),
        }
    }

    #[test]
    fn test_optional_group_that_did_not_participate_is_dropped() {
        let registry = PluginRegistry::new()
            .with(PatternPlugin::new("news", r"(?i)^/news(?:\s+(.+))?$"));
        match registry.find_plugin_for_message("/news") {
            TriggerMatch::PluginMatch { args, .. } => assert!(args.is_empty()),
            TriggerMatch::NoMatch => panic!("expected news to match"),
        }
    }

    #[test]
    fn test_case_insensitive_triggers() {
        assert_eq!(
            registry().find_plugin_for_message("/WEATHER Paris").plugin_name(),
            Some("weather")
        );
    }

    #[test]
    fn test_no_match() {
        let result = registry().find_plugin_for_message("hello");
        assert!(!result.is_match());
        assert!(registry().find_plugin_for_message("/calc").plugin_name().is_none());
    }

    #[test]
    fn test_help_entries_follow_registration_order() {
        let names: Vec<String> = registry()
            .help_entries()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["weather", "calc", "define"]);
    }
}
