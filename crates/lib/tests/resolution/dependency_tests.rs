//! Dependency declaration, visibility resolution and ordinal tests.

use strata_lib::target::{ResolvedDependency, TargetState};
use strata_lib::{Error, NamespaceId, Project, TargetId, Visibility};

use super::common::TestProject;

const ROOT: NamespaceId = NamespaceId::ROOT;

fn resolved(project: &Project, id: TargetId) -> Vec<(String, Visibility)> {
  project
    .resolve_dependencies(id)
    .unwrap()
    .iter()
    .map(|d: &ResolvedDependency| (project.target(d.target).unwrap().path().to_string(), d.visibility))
    .collect()
}

// ==========================================================================
// Visibility
// ==========================================================================

#[test]
fn private_dependency_hides_its_own_graph() {
  let mut t = TestProject::new();
  let p = &mut t.project;
  let e = p.library(ROOT, "e", |_| Ok(())).unwrap();
  let d = p
    .library(ROOT, "d", |b| {
      b.public(e)?;
      Ok(())
    })
    .unwrap();
  let target = p
    .library(ROOT, "t", |b| {
      b.private(d)?;
      Ok(())
    })
    .unwrap();

  assert_eq!(resolved(p, target), vec![("/d".to_string(), Visibility::Private)]);
}

#[test]
fn public_chain_is_transitive() {
  let mut t = TestProject::new();
  let p = &mut t.project;
  let e = p.library(ROOT, "e", |_| Ok(())).unwrap();
  let d = p
    .library(ROOT, "d", |b| {
      b.public(e)?;
      Ok(())
    })
    .unwrap();
  let target = p
    .library(ROOT, "t", |b| {
      b.public(d)?;
      Ok(())
    })
    .unwrap();
  let consumer = p
    .executable(ROOT, "consumer", |b| {
      b.public(target)?;
      Ok(())
    })
    .unwrap();

  assert_eq!(
    resolved(p, target),
    vec![("/e".to_string(), Visibility::Public), ("/d".to_string(), Visibility::Public)]
  );
  assert!(resolved(p, consumer).contains(&("/e".to_string(), Visibility::Public)));
}

#[test]
fn runtime_dependencies_relay_like_public() {
  let mut t = TestProject::new();
  let p = &mut t.project;
  let hidden = p.library(ROOT, "hidden", |_| Ok(())).unwrap();
  let shown = p.library(ROOT, "shown", |_| Ok(())).unwrap();
  let plugin = p
    .library(ROOT, "plugin", |b| {
      b.public(shown)?;
      b.private(hidden)?;
      Ok(())
    })
    .unwrap();
  let app = p
    .executable(ROOT, "app", |b| {
      b.runtime(plugin)?;
      Ok(())
    })
    .unwrap();

  let graph = resolved(p, app);
  assert!(graph.contains(&("/plugin".to_string(), Visibility::Runtime)));
  assert!(graph.contains(&("/shown".to_string(), Visibility::Public)));
  assert!(!graph.iter().any(|(path, _)| path == "/hidden"));
}

#[test]
fn first_discovered_visibility_wins() {
  let mut t = TestProject::new();
  let p = &mut t.project;
  let x = p.library(ROOT, "x", |_| Ok(())).unwrap();
  let d = p
    .library(ROOT, "d", |b| {
      b.public(x)?;
      Ok(())
    })
    .unwrap();
  let target = p
    .library(ROOT, "t", |b| {
      b.public(d)?;
      b.private(x)?;
      Ok(())
    })
    .unwrap();

  let graph = resolved(p, target);
  assert!(graph.contains(&("/x".to_string(), Visibility::Private)));
  assert_eq!(graph.iter().filter(|(path, _)| path == "/x").count(), 1);
}

#[test]
fn resolution_is_memoized_and_marks_target_resolved() {
  let mut t = TestProject::new();
  let p = &mut t.project;
  let lib = p.library(ROOT, "lib", |_| Ok(())).unwrap();
  let app = p
    .executable(ROOT, "app", |b| {
      b.private(lib)?;
      Ok(())
    })
    .unwrap();

  assert_eq!(p.target(app).unwrap().state(), TargetState::Configured);
  let first = p.resolve_dependencies(app).unwrap().as_ptr();
  let second = p.resolve_dependencies(app).unwrap().as_ptr();
  assert_eq!(first, second);
  assert_eq!(p.target(app).unwrap().state(), TargetState::Resolved);
}

// ==========================================================================
// Ordinals
// ==========================================================================

#[test]
fn ordinals_increase_along_every_edge() {
  let mut t = TestProject::new();
  let p = &mut t.project;
  let base = p.headers(ROOT, "base", |_| Ok(())).unwrap();
  let left = p
    .library(ROOT, "left", |b| {
      b.public(base)?;
      Ok(())
    })
    .unwrap();
  let right = p
    .library(ROOT, "right", |b| {
      b.private(base)?;
      Ok(())
    })
    .unwrap();
  let top = p
    .executable(ROOT, "top", |b| {
      b.private(left)?;
      b.runtime(right)?;
      Ok(())
    })
    .unwrap();

  // Query the dependent first so dependencies are numbered recursively.
  let top_ordinal = p.ordinal(top).unwrap();
  for id in [base, left, right, top] {
    for link in p.links(id).unwrap() {
      assert!(p.ordinal(link.target).unwrap() < p.ordinal(id).unwrap());
    }
  }
  assert_eq!(top_ordinal, 4);
  assert!(p.ordinal(left).unwrap() < p.ordinal(right).unwrap());
}

#[test]
fn ordinals_are_assigned_once() {
  let mut t = TestProject::new();
  let p = &mut t.project;
  let a = p.library(ROOT, "a", |_| Ok(())).unwrap();
  let b = p.library(ROOT, "b", |_| Ok(())).unwrap();

  let first = p.ordinal(a).unwrap();
  assert_eq!(p.ordinal(a).unwrap(), first);
  assert_eq!(p.ordinal(a).unwrap(), first);
  assert_eq!(p.ordinal(b).unwrap(), first + 1);
}

#[test]
fn resolved_dependencies_are_sorted_by_ordinal() {
  let mut t = TestProject::new();
  let p = &mut t.project;
  let zeta = p.library(ROOT, "zeta", |_| Ok(())).unwrap();
  let alpha = p
    .library(ROOT, "alpha", |b| {
      b.public(zeta)?;
      Ok(())
    })
    .unwrap();
  let app = p
    .executable(ROOT, "app", |b| {
      b.public(alpha)?;
      Ok(())
    })
    .unwrap();

  let order: Vec<u64> = p
    .resolve_dependencies(app)
    .unwrap()
    .iter()
    .map(|d| p.ordinal(d.target).unwrap())
    .collect();
  let mut sorted = order.clone();
  sorted.sort();
  assert_eq!(order, sorted);
  assert_eq!(resolved(p, app)[0].0, "/zeta");
}

// ==========================================================================
// Declaration errors
// ==========================================================================

#[test]
fn duplicate_dependency_under_any_visibility_fails() {
  let mut t = TestProject::new();
  let p = &mut t.project;
  let lib = p.library(ROOT, "lib", |_| Ok(())).unwrap();

  let err = p
    .executable(ROOT, "app", |b| {
      b.public(lib)?;
      b.runtime(lib)?;
      Ok(())
    })
    .unwrap_err();
  assert!(matches!(err, Error::DuplicateDependency { ref dependency, .. } if dependency == "/lib"));

  let err = p
    .executable(ROOT, "app2", |b| {
      b.private(lib)?;
      b.depend_on_path("lib", Visibility::Public)?;
      Ok(())
    })
    .unwrap_err();
  assert!(matches!(err, Error::DuplicateDependency { .. }));
}

#[test]
fn namespace_is_not_a_dependency() {
  let mut t = TestProject::new();
  let p = &mut t.project;
  p.namespace(ROOT, "engine", |_| Ok(())).unwrap();

  let err = p
    .executable(ROOT, "app", |b| {
      b.depend_on_path("/engine", Visibility::Private)?;
      Ok(())
    })
    .unwrap_err();
  assert!(matches!(err, Error::NotATarget { ref path, .. } if path == "/engine"));
}

#[test]
fn forward_reference_to_later_namespace_fails_at_link_time() {
  let mut t = TestProject::new();
  let p = &mut t.project;
  let app = p
    .executable(ROOT, "app", |b| {
      b.depend_on_path("/tools", Visibility::Private)?;
      Ok(())
    })
    .unwrap();
  p.namespace(ROOT, "tools", |_| Ok(())).unwrap();

  assert!(matches!(p.resolve_dependencies(app), Err(Error::NotATarget { .. })));
}

#[test]
fn forward_reference_resolves_once_declared() {
  let mut t = TestProject::new();
  let p = &mut t.project;
  let engine = p.namespace(ROOT, "engine", |_| Ok(())).unwrap();
  let app = p
    .executable(ROOT, "app", |b| {
      b.depend_on_path("/engine/core", Visibility::Public)?;
      Ok(())
    })
    .unwrap();
  p.library(engine, "core", |_| Ok(())).unwrap();

  assert_eq!(resolved(p, app), vec![("/engine/core".to_string(), Visibility::Public)]);
}

#[test]
fn cycle_through_forward_reference_is_fatal() {
  let mut t = TestProject::new();
  let p = &mut t.project;
  let a = p
    .library(ROOT, "a", |b| {
      b.depend_on_path("b", Visibility::Public)?;
      Ok(())
    })
    .unwrap();
  p.library(ROOT, "b", |b| {
    b.private(a)?;
    Ok(())
  })
  .unwrap();

  let err = p.resolve_dependencies(a).unwrap_err();
  assert!(matches!(err, Error::CycleDetected { ref chain } if chain == "/a -> /b -> /a"));
  assert!(p.build_order().is_err());
}

#[test]
fn pending_reference_does_not_block_independent_targets() {
  let mut t = TestProject::new();
  let p = &mut t.project;
  let waiting = p
    .library(ROOT, "waiting", |b| {
      b.depend_on_path("/later", Visibility::Public)?;
      Ok(())
    })
    .unwrap();
  let standalone = p.executable(ROOT, "standalone", |_| Ok(())).unwrap();

  let env = p.environment("linux64", "debug", "clang").unwrap();
  assert!(env.expand(p, standalone).is_ok());
  assert!(matches!(env.expand(p, waiting), Err(Error::UnknownTarget(ref path)) if path == "/later"));

  p.library(ROOT, "later", |_| Ok(())).unwrap();
  assert!(env.expand(p, waiting).is_ok());
  assert_eq!(resolved(p, waiting), vec![("/later".to_string(), Visibility::Public)]);
}

#[test]
fn ordinal_query_alone_marks_target_resolved() {
  let mut t = TestProject::new();
  let p = &mut t.project;
  let lib = p.library(ROOT, "lib", |_| Ok(())).unwrap();

  p.ordinal(lib).unwrap();
  assert_eq!(p.target(lib).unwrap().state(), TargetState::Resolved);
}
