//! Unit tests for forai-core

use std::path::Path;

use tempfile::TempDir;

use crate::header;
use crate::model::*;
use crate::query::QueryEngine;
use crate::registry::SymbolRegistry;
use crate::tracker::DependencyTracker;

fn registry(dir: &TempDir) -> SymbolRegistry {
    SymbolRegistry::open(dir.path()).unwrap()
}

fn write(dir: &TempDir, rel: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

// ── registry ────────────────────────────────────────────

#[test]
fn file_id_assignment_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let reg = registry(&dir);

    let a = reg.file_id_for(Path::new("user.py")).unwrap();
    let b = reg.file_id_for(Path::new("user.py")).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.to_string(), "F101");

    let c = reg.file_id_for(Path::new("admin.py")).unwrap();
    assert_ne!(a, c);
    assert_eq!(c.to_string(), "F102");
}

#[test]
fn absolute_paths_normalize_to_workspace_relative() {
    let dir = TempDir::new().unwrap();
    let reg = registry(&dir);

    let rel = reg.file_id_for(Path::new("pkg/user.py")).unwrap();
    let abs = reg.file_id_for(&dir.path().join("pkg/user.py")).unwrap();
    assert_eq!(rel, abs);
}

#[test]
fn symbol_id_is_stable_across_kind_drift() {
    let dir = TempDir::new().unwrap();
    let reg = registry(&dir);
    let file = reg.file_id_for(Path::new("user.py")).unwrap();

    let first = reg.symbol_id_for(file, "User", SymbolKind::Class).unwrap();
    let second = reg.symbol_id_for(file, "User", SymbolKind::Class).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_string(), "C1");

    // Kind is only consulted on first mint.
    let drift = reg.symbol_id_for(file, "User", SymbolKind::Function).unwrap();
    assert_eq!(first, drift);
}

#[test]
fn class_and_function_counters_are_independent() {
    let dir = TempDir::new().unwrap();
    let reg = registry(&dir);
    let file = reg.file_id_for(Path::new("user.py")).unwrap();

    let user = reg.symbol_id_for(file, "User", SymbolKind::Class).unwrap();
    let login = reg.symbol_id_for(file, "login", SymbolKind::Function).unwrap();
    let admin = reg.symbol_id_for(file, "Admin", SymbolKind::Class).unwrap();
    let limit = reg.symbol_id_for(file, "LIMIT", SymbolKind::Variable).unwrap();

    assert_eq!(user.to_string(), "C1");
    assert_eq!(login.to_string(), "F1");
    assert_eq!(admin.to_string(), "C2");
    assert_eq!(limit.to_string(), "F2");
}

#[test]
fn registry_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let (file, symbol) = {
        let reg = registry(&dir);
        let file = reg.file_id_for(Path::new("user.py")).unwrap();
        let symbol = reg.symbol_id_for(file, "User", SymbolKind::Class).unwrap();
        (file, symbol)
    };

    let reg = registry(&dir);
    assert_eq!(reg.file_id_for(Path::new("user.py")).unwrap(), file);
    assert_eq!(
        reg.symbol_id_for(file, "User", SymbolKind::Class).unwrap(),
        symbol
    );
    // Counters resume, they do not reset.
    let next = reg.file_id_for(Path::new("other.py")).unwrap();
    assert_eq!(next.to_string(), "F102");
}

#[test]
fn corrupt_registry_reinitializes() {
    let dir = TempDir::new().unwrap();
    {
        let reg = registry(&dir);
        reg.file_id_for(Path::new("user.py")).unwrap();
    }
    std::fs::write(crate::registry_path(dir.path()), "{not json").unwrap();

    let reg = registry(&dir);
    // History is gone; ids are re-minted from the initial counter.
    let id = reg.file_id_for(Path::new("user.py")).unwrap();
    assert_eq!(id.to_string(), "F101");
}

#[test]
fn rename_preserves_identity_and_symbols() {
    let dir = TempDir::new().unwrap();
    let reg = registry(&dir);

    let before = reg.file_id_for(Path::new("user.py")).unwrap();
    let symbol = reg.symbol_id_for(before, "User", SymbolKind::Class).unwrap();

    let renamed = reg.rename(Path::new("user.py"), Path::new("models/user.py")).unwrap();
    assert_eq!(before, renamed);
    assert_eq!(reg.file_id_for(Path::new("models/user.py")).unwrap(), before);
    assert_eq!(
        reg.symbol_id_for(before, "User", SymbolKind::Class).unwrap(),
        symbol
    );
    assert_eq!(reg.relative_path_of(before).unwrap(), "models/user.py");
}

#[test]
fn rename_of_unknown_path_registers_new_file() {
    let dir = TempDir::new().unwrap();
    let reg = registry(&dir);

    let id = reg.rename(Path::new("ghost.py"), Path::new("real.py")).unwrap();
    assert_eq!(reg.file_id_for(Path::new("real.py")).unwrap(), id);
}

#[test]
fn remove_does_not_renumber_other_files() {
    let dir = TempDir::new().unwrap();
    let reg = registry(&dir);

    let a = reg.file_id_for(Path::new("a.py")).unwrap();
    let b = reg.file_id_for(Path::new("b.py")).unwrap();
    reg.remove(a).unwrap();

    assert_eq!(reg.file_id_for(Path::new("b.py")).unwrap(), b);
    // The removed id is never reused.
    let again = reg.file_id_for(Path::new("a.py")).unwrap();
    assert_ne!(again, a);
}

#[test]
fn resolve_import_handles_wildcard_pending_and_miss() {
    let dir = TempDir::new().unwrap();
    let reg = registry(&dir);
    let file = reg.file_id_for(Path::new("pkg/user.py")).unwrap();

    // Whole-module import resolves to the wildcard.
    let star = reg.resolve_import("pkg.user", "*").unwrap();
    assert_eq!(star, SymbolRef::wildcard(file));

    // File known but symbol not yet analyzed: pending, not a failure.
    let pending = reg.resolve_import("pkg.user", "User").unwrap();
    assert_eq!(pending.file, file);
    assert_eq!(pending.symbol, SymbolTarget::Pending);

    // Once the symbol is registered, the same lookup resolves fully.
    let sym = reg.symbol_id_for(file, "User", SymbolKind::Class).unwrap();
    let resolved = reg.resolve_import("pkg.user", "User").unwrap();
    assert_eq!(resolved, SymbolRef::named(file, sym));

    // Unknown module path resolves to nothing.
    assert!(reg.resolve_import("no.such.module", "User").is_none());
}

// ── header codec ────────────────────────────────────────

fn sample_analysis() -> FileAnalysis {
    FileAnalysis {
        file_id: FileId(101),
        language: Language::Python,
        definitions: vec![
            Definition::new(SymbolId::new(IdSpace::Class, 1), "User"),
            Definition::new(SymbolId::new(IdSpace::Func, 1), "login"),
        ],
        imports: Vec::new(),
        exports: vec![SymbolId::new(IdSpace::Class, 1), SymbolId::new(IdSpace::Func, 1)],
    }
}

#[test]
fn encode_matches_canonical_shape() {
    let header = header::encode(&sample_analysis());
    assert_eq!(header, "//FORAI:F101;DEF[C1:User,F1:login];IMP[];EXP[C1,F1]//");
}

#[test]
fn round_trip_preserves_multi_parent_definitions() {
    let mut analysis = sample_analysis();
    analysis.definitions.push(Definition {
        id: SymbolId::new(IdSpace::Class, 2),
        name: "Admin".to_string(),
        parents: vec![
            ParentRef::Name("Base1".to_string()),
            ParentRef::Name("Base2".to_string()),
            ParentRef::Remote(SymbolRef::named(FileId(102), SymbolId::new(IdSpace::Class, 3))),
        ],
    });
    analysis.imports.push(SymbolRef::named(
        FileId(102),
        SymbolId::new(IdSpace::Class, 3),
    ));
    analysis.imports.push(SymbolRef::wildcard(FileId(103)));

    let encoded = header::encode(&analysis);
    let decoded = header::decode(&encoded);
    assert_eq!(decoded, analysis);

    // The entry after the multi-parent group must not be corrupted.
    assert_eq!(decoded.definitions[2].parents.len(), 3);
    assert_eq!(decoded.exports, analysis.exports);
}

#[test]
fn lang_group_round_trips_for_non_python() {
    let mut analysis = sample_analysis();
    analysis.language = Language::JavaScript;

    let encoded = header::encode(&analysis);
    assert!(encoded.ends_with(";LANG[javascript]//"));
    assert_eq!(header::decode(&encoded), analysis);
}

#[test]
fn decode_tolerates_absence_and_garbage() {
    assert!(header::decode_file("def f():\n    pass\n").is_none());

    // Sentinel present but grammar violated: degrade, never panic.
    let degraded = header::decode("//FORAI:garbage;DEF[:];IMP[oops];EXP[?]//");
    assert_eq!(degraded.file_id, FileId::UNKNOWN);
    assert!(degraded.definitions.is_empty());
    assert!(degraded.imports.is_empty());
    assert!(degraded.exports.is_empty());
}

#[test]
fn header_outside_scan_prefix_is_ignored() {
    let mut content = String::new();
    for _ in 0..200 {
        content.push_str("# padding line\n");
    }
    content.push_str("//FORAI:F101;DEF[];IMP[];EXP[]//\n");
    assert!(content.len() > header::SCAN_LIMIT);
    assert!(header::decode_file(&content).is_none());
}

#[test]
fn insert_places_header_after_python_boilerplate() {
    let header_text = header::encode(&sample_analysis());
    let content = "#!/usr/bin/env python3\n# -*- coding: utf-8 -*-\n\nclass User:\n    pass\n";
    let updated = header::locate_or_insert(content, &header_text, Language::Python);

    let expected = format!(
        "#!/usr/bin/env python3\n# -*- coding: utf-8 -*-\n\n{header_text}\n\nclass User:\n    pass\n"
    );
    assert_eq!(updated, expected);
}

#[test]
fn insert_is_idempotent() {
    let header_text = header::encode(&sample_analysis());
    let content = "class User:\n    pass\n";

    let once = header::locate_or_insert(content, &header_text, Language::Python);
    let twice = header::locate_or_insert(&once, &header_text, Language::Python);
    assert_eq!(once, twice);
}

#[test]
fn replace_preserves_the_rest_of_the_file() {
    let old = header::encode(&sample_analysis());
    let content = format!("#!/usr/bin/env python3\n{old}\n\nclass User:\n    pass\n# trailing\n");

    let mut changed = sample_analysis();
    changed.imports.push(SymbolRef::wildcard(FileId(102)));
    let new = header::encode(&changed);

    let updated = header::locate_or_insert(&content, &new, Language::Python);
    assert_eq!(
        updated,
        format!("#!/usr/bin/env python3\n{new}\n\nclass User:\n    pass\n# trailing\n")
    );
}

// ── dependency tracker ──────────────────────────────────

#[test]
fn direct_dependents_are_one_hop_only() {
    let dir = TempDir::new().unwrap();
    let reg = registry(&dir);

    let a = reg.file_id_for(Path::new("a.py")).unwrap();
    let b = reg.file_id_for(Path::new("b.py")).unwrap();
    let c = reg.file_id_for(Path::new("c.py")).unwrap();

    write(&dir, "a.py", &format!("//FORAI:{a};DEF[];IMP[];EXP[]//\n"));
    write(&dir, "b.py", &format!("//FORAI:{b};DEF[];IMP[{a}:*];EXP[]//\n"));
    write(&dir, "c.py", &format!("//FORAI:{c};DEF[];IMP[{b}:*];EXP[]//\n"));

    let tracker = DependencyTracker::new(&reg);
    assert_eq!(tracker.direct_dependents(a), vec![b]);
    assert_eq!(tracker.direct_dependents(b), vec![c]);
    assert!(tracker.direct_dependents(c).is_empty());
}

#[test]
fn graph_excludes_self_references_and_missing_files() {
    let dir = TempDir::new().unwrap();
    let reg = registry(&dir);

    let a = reg.file_id_for(Path::new("a.py")).unwrap();
    let b = reg.file_id_for(Path::new("b.py")).unwrap();
    let ghost = reg.file_id_for(Path::new("ghost.py")).unwrap();

    write(&dir, "a.py", &format!("//FORAI:{a};DEF[];IMP[{a}:*,{b}:*];EXP[]//\n"));
    write(&dir, "b.py", &format!("//FORAI:{b};DEF[];IMP[];EXP[]//\n"));
    // ghost.py is registered but absent from disk.

    let tracker = DependencyTracker::new(&reg);
    let graph = tracker.build_graph();
    assert_eq!(graph.imports_of(a), vec![b]);
    let map = graph.as_map();
    assert!(!map.contains_key(&ghost));
}

#[test]
fn graph_is_rebuilt_from_disk_on_every_call() {
    let dir = TempDir::new().unwrap();
    let reg = registry(&dir);

    let a = reg.file_id_for(Path::new("a.py")).unwrap();
    let b = reg.file_id_for(Path::new("b.py")).unwrap();

    write(&dir, "a.py", &format!("//FORAI:{a};DEF[];IMP[];EXP[]//\n"));
    write(&dir, "b.py", &format!("//FORAI:{b};DEF[];IMP[];EXP[]//\n"));

    let tracker = DependencyTracker::new(&reg);
    assert!(tracker.direct_dependents(a).is_empty());

    // Rewriting b's header on disk is reflected without any invalidation.
    write(&dir, "b.py", &format!("//FORAI:{b};DEF[];IMP[{a}:*];EXP[]//\n"));
    assert_eq!(tracker.direct_dependents(a), vec![b]);
}

#[test]
fn propagate_isolates_per_file_failures() {
    let dir = TempDir::new().unwrap();
    let reg = registry(&dir);

    let a = reg.file_id_for(Path::new("a.py")).unwrap();
    let b = reg.file_id_for(Path::new("b.py")).unwrap();
    let c = reg.file_id_for(Path::new("c.py")).unwrap();

    write(&dir, "a.py", &format!("//FORAI:{a};DEF[];IMP[];EXP[]//\n"));
    write(&dir, "b.py", &format!("//FORAI:{b};DEF[];IMP[{a}:*];EXP[]//\n"));
    write(&dir, "c.py", &format!("//FORAI:{c};DEF[];IMP[{a}:*];EXP[]//\n"));

    let tracker = DependencyTracker::new(&reg);
    let mut seen = Vec::new();
    let touched = tracker.propagate(a, |path| {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        seen.push(name.clone());
        if name == "b.py" {
            anyhow::bail!("simulated analyzer failure");
        }
        Ok(())
    });

    // Both dependents were attempted; only the successful one is reported.
    assert_eq!(seen.len(), 2);
    assert_eq!(touched, vec![c]);
}

// ── import-set change gate ──────────────────────────────

#[test]
fn import_set_comparison_is_order_and_duplicate_insensitive() {
    let a = FileId(101);
    let b = FileId(102);

    let mut old = FileAnalysis::empty(FileId(1));
    old.imports = vec![SymbolRef::wildcard(a), SymbolRef::wildcard(b)];

    let mut reordered = FileAnalysis::empty(FileId(1));
    reordered.imports = vec![
        SymbolRef::wildcard(b),
        SymbolRef::wildcard(a),
        SymbolRef::wildcard(a),
    ];
    assert_eq!(old.import_set(), reordered.import_set());

    let mut grown = FileAnalysis::empty(FileId(1));
    grown.imports = vec![SymbolRef::wildcard(a)];
    assert_ne!(old.import_set(), grown.import_set());
}

// ── query engine ────────────────────────────────────────

#[test]
fn query_finds_definitions_and_usages() {
    let dir = TempDir::new().unwrap();
    let reg = registry(&dir);

    let user = reg.file_id_for(Path::new("user.py")).unwrap();
    let user_sym = reg.symbol_id_for(user, "User", SymbolKind::Class).unwrap();
    let admin = reg.file_id_for(Path::new("admin.py")).unwrap();
    let star = reg.file_id_for(Path::new("star.py")).unwrap();
    let other = reg.file_id_for(Path::new("other.py")).unwrap();

    write(
        &dir,
        "user.py",
        &format!("//FORAI:{user};DEF[{user_sym}:User];IMP[];EXP[{user_sym}]//\n"),
    );
    write(
        &dir,
        "admin.py",
        &format!("//FORAI:{admin};DEF[];IMP[{user}:{user_sym}];EXP[]//\n"),
    );
    write(
        &dir,
        "star.py",
        &format!("//FORAI:{star};DEF[];IMP[{user}:*];EXP[]//\n"),
    );
    write(&dir, "other.py", &format!("//FORAI:{other};DEF[];IMP[];EXP[]//\n"));

    let query = QueryEngine::new(&reg);

    let def = query.find_definition("User").unwrap();
    assert_eq!(def.file_id, user);
    assert_eq!(def.symbol_id, user_sym);

    let mut usage_ids: Vec<FileId> = query.usages("User").into_iter().map(|(id, _)| id).collect();
    usage_ids.sort();
    assert_eq!(usage_ids, vec![admin, star]);

    let (found, symbols) = query.file_symbols(Path::new("user.py")).unwrap();
    assert_eq!(found, user);
    assert_eq!(symbols.get("User"), Some(&user_sym));

    let header = query.file_header(&dir.path().join("admin.py")).unwrap();
    assert!(header.starts_with("//FORAI:"));
    assert!(query.usages("Missing").is_empty());
}
