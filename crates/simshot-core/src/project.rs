//! Locates the Xcode workspace or project to build.

use std::path::{Path, PathBuf};

use crate::command::Token;
use crate::config::SnapshotConfig;

/// The workspace or project `xcodebuild` should operate on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Project {
    Workspace { path: PathBuf, scheme: Option<String> },
    Project { path: PathBuf, scheme: Option<String> },
}

impl Project {
    /// Picks the workspace if configured, else the project. `None` when neither is set.
    pub fn from_config(config: &SnapshotConfig) -> Option<Self> {
        let scheme = config.scheme.clone();
        match (&config.workspace, &config.project) {
            (Some(path), _) => Some(Project::Workspace {
                path: path.clone(),
                scheme,
            }),
            (None, Some(path)) => Some(Project::Project {
                path: path.clone(),
                scheme,
            }),
            (None, None) => None,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Project::Workspace { path, .. } | Project::Project { path, .. } => path,
        }
    }

    pub fn scheme(&self) -> Option<&str> {
        match self {
            Project::Workspace { scheme, .. } | Project::Project { scheme, .. } => scheme.as_deref(),
        }
    }

    /// `-workspace <path>` or `-project <path>`, followed by `-scheme <scheme>` if set.
    pub fn xcodebuild_parameters(&self) -> Vec<Token> {
        let flag = match self {
            Project::Workspace { .. } => "-workspace",
            Project::Project { .. } => "-project",
        };
        let mut params = vec![
            Token::arg(flag),
            Token::arg(self.path().to_string_lossy()),
        ];
        if let Some(scheme) = self.scheme() {
            params.push(Token::arg("-scheme"));
            params.push(Token::arg(scheme));
        }
        params
    }

    /// The workspace/project file name without its extension.
    pub fn default_app_name(&self) -> String {
        self.path()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(tokens: &[Token]) -> Vec<String> {
        tokens.iter().map(Token::render).collect()
    }

    #[test]
    fn workspace_takes_precedence() {
        let config = SnapshotConfig {
            workspace: Some(PathBuf::from("ios/App.xcworkspace")),
            project: Some(PathBuf::from("ios/App.xcodeproj")),
            scheme: Some("App".to_string()),
            ..Default::default()
        };
        let project = Project::from_config(&config).unwrap();
        assert_eq!(
            render(&project.xcodebuild_parameters()),
            vec!["-workspace", "ios/App.xcworkspace", "-scheme", "App"]
        );
    }

    #[test]
    fn project_without_scheme() {
        let config = SnapshotConfig {
            project: Some(PathBuf::from("My App.xcodeproj")),
            ..Default::default()
        };
        let project = Project::from_config(&config).unwrap();
        assert_eq!(
            render(&project.xcodebuild_parameters()),
            vec!["-project", "'My App.xcodeproj'"]
        );
        assert_eq!(project.default_app_name(), "My App");
    }

    #[test]
    fn nothing_configured() {
        assert_eq!(Project::from_config(&SnapshotConfig::default()), None);
    }
}
