use chrono::{TimeZone, Utc};
use release_toolkit::boundary::{BoundaryOrigin, BoundaryWarning};
use release_toolkit::config::{BoundaryMode, SourceControlConfig, TaggerConfig};
use release_toolkit::domain::{ClassifiedCommit, Commit, Version, Workspace};
use release_toolkit::github::{MockRemote, RemoteRepository};
use release_toolkit::locator::ReleaseLocator;
use release_toolkit::publisher::ReleasePublisher;

// ============================================================================
// BoundaryWarning Display Tests
// ============================================================================

#[test]
fn test_boundary_warning_no_new_commits_display() {
    let warning = BoundaryWarning::NoNewCommits {
        previous_version: Version::new(1, 0, 0),
        head_sha: "abc1234def5678".to_string(),
    };

    let display_msg = warning.to_string();
    assert!(
        display_msg.contains("No new commits"),
        "Message should contain 'No new commits', got: {}",
        display_msg
    );
    assert!(
        display_msg.contains("1.0.0"),
        "Message should contain version '1.0.0', got: {}",
        display_msg
    );
    assert!(
        display_msg.contains("abc1234") && !display_msg.contains("abc1234d"),
        "Message should contain shortened commit hash 'abc1234', got: {}",
        display_msg
    );
}

#[test]
fn test_boundary_warning_unparsable_tag_display() {
    let warning = BoundaryWarning::UnparsableTag {
        tag: "web-99999999999999999999.0.0".to_string(),
        reason: "version component out of range".to_string(),
    };

    let display_msg = warning.to_string();
    assert!(
        display_msg.contains("Cannot parse tag"),
        "Message should contain 'Cannot parse tag', got: {}",
        display_msg
    );
    assert!(
        display_msg.contains("out of range"),
        "Message should contain the reason, got: {}",
        display_msg
    );
}

#[test]
fn test_boundary_warning_missing_trailer_fields_display() {
    let cutoff = BoundaryWarning::MissingCutoff {
        tag: "web-1.0.0".to_string(),
    };
    let version = BoundaryWarning::MissingVersion {
        tag: "web-1.0.0".to_string(),
    };

    assert!(cutoff.to_string().contains("last-commit"));
    assert!(version.to_string().contains("no readable version"));
    assert!(cutoff.to_string().contains("web-1.0.0"));
}

#[test]
fn test_boundary_warning_no_path_history_display() {
    let warning = BoundaryWarning::NoPathHistory {
        path: "packages/web".to_string(),
        branch: "main".to_string(),
    };
    assert_eq!(
        warning.to_string(),
        "No commit on 'main' touches 'packages/web'"
    );
}

// ============================================================================
// Publish then locate
// ============================================================================

fn head_commit() -> Commit {
    Commit {
        sha: "53df6d85a3f9015ef416f968331d33dbeeab135d".to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 7, 2, 19, 8, 58).unwrap(),
        message: "feat(): add login page".to_string(),
        files: vec!["packages/web/login.js".to_string()],
        parents: vec![],
    }
}

fn source_control(boundary: BoundaryMode) -> SourceControlConfig {
    SourceControlConfig {
        tag_pattern: "web-{version}".to_string(),
        release_pattern: "Web {version}".to_string(),
        boundary,
    }
}

#[tokio::test]
async fn test_published_release_is_found_by_next_run() {
    let remote = MockRemote::new();
    remote.add_commit(head_commit());
    let workspace = Workspace::new("web", "packages/web", "main", vec![]);
    let tagger = TaggerConfig::default();
    let config = source_control(BoundaryMode::ReleaseBody);

    let classified = vec![ClassifiedCommit {
        commit: head_commit(),
        title: "Features".to_string(),
    }];
    ReleasePublisher::new(&remote, &tagger, false)
        .publish(&workspace, &config, Version::new(0, 1, 0), &classified)
        .await
        .unwrap();

    let boundary = ReleaseLocator::new(&remote)
        .locate(&workspace, &config)
        .await
        .unwrap()
        .expect("published release should be located");

    assert_eq!(boundary.previous_version, Version::new(0, 1, 0));
    assert_eq!(boundary.cutoff, head_commit().timestamp);
    assert_eq!(boundary.origin, BoundaryOrigin::Release("web-0.1.0".to_string()));
    assert!(!boundary.is_synthetic());
}

#[tokio::test]
async fn test_published_tag_is_found_in_tag_mode() {
    let remote = MockRemote::new();
    remote.add_commit(head_commit());
    let workspace = Workspace::new("web", "packages/web", "main", vec![]);
    let tagger = TaggerConfig::default();
    let config = source_control(BoundaryMode::Tags);

    let classified = vec![ClassifiedCommit {
        commit: head_commit(),
        title: "Features".to_string(),
    }];
    ReleasePublisher::new(&remote, &tagger, false)
        .publish(&workspace, &config, Version::new(2, 0, 1), &classified)
        .await
        .unwrap();

    let boundary = ReleaseLocator::new(&remote)
        .locate(&workspace, &config)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(boundary.previous_version, Version::new(2, 0, 1));
    assert_eq!(boundary.cutoff, head_commit().timestamp);
}

#[tokio::test]
async fn test_release_of_other_workspace_is_not_a_boundary() {
    let remote = MockRemote::new();
    remote.add_commit(head_commit());
    let api = Workspace::new("api", "packages/api", "main", vec![]);
    let web = Workspace::new("web", "packages/web", "main", vec![]);
    let tagger = TaggerConfig::default();
    let config = source_control(BoundaryMode::ReleaseBody);

    let classified = vec![ClassifiedCommit {
        commit: head_commit(),
        title: "Features".to_string(),
    }];
    ReleasePublisher::new(&remote, &tagger, false)
        .publish(&api, &config, Version::new(0, 1, 0), &classified)
        .await
        .unwrap();

    let located = ReleaseLocator::new(&remote).locate(&web, &config).await.unwrap();
    assert!(located.is_none());
}

#[tokio::test]
async fn test_dry_run_publish_leaves_nothing_to_locate() {
    let remote = MockRemote::new();
    remote.add_commit(head_commit());
    let workspace = Workspace::new("web", "packages/web", "main", vec![]);
    let tagger = TaggerConfig::default();
    let config = source_control(BoundaryMode::ReleaseBody);

    let classified = vec![ClassifiedCommit {
        commit: head_commit(),
        title: "Features".to_string(),
    }];
    let published = ReleasePublisher::new(&remote, &tagger, true)
        .publish(&workspace, &config, Version::new(0, 1, 0), &classified)
        .await
        .unwrap();

    assert_eq!(published.url, "web-0.1.0");
    assert_eq!(remote.write_count(), 0);
    assert!(remote.list_releases(1, 100).await.unwrap().is_empty());
}
