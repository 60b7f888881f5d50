//! Global enrichment: classifies every call as local or cross-file and
//! rewrites each function's enrichment-only fields.

use std::collections::HashMap;

use crate::model::{FileContext, ResolvedCall};

use super::call_graph::CallGraph;

const EXTERNAL_FILE: &str = "external";

/// Enrich every function in `files` in place, returning the same files
/// with `local_calls`/`cross_file_calls`/`local_callers`/`cross_file_callers`
/// populated. `calls[]` and `called_by[]` are left untouched.
pub fn enrich(mut files: Vec<FileContext>) -> Vec<FileContext> {
    let defining_file = build_defining_file_map(&files);
    let graph = CallGraph::build_from_files(&files);

    for fc in files.iter_mut() {
        let path = fc.path.clone();
        for f in fc.functions.iter_mut() {
            f.local_calls.clear();
            f.cross_file_calls.clear();
            f.local_callers.clear();
            f.cross_file_callers.clear();

            for site in f.resolved_call_sites() {
                match defining_file.get(&site.name) {
                    Some(target_file) if *target_file == path => {
                        f.local_calls.push(site.name);
                    }
                    Some(target_file) => {
                        f.cross_file_calls.push(ResolvedCall {
                            name: site.name,
                            file: target_file.clone(),
                            line: site.line,
                            call_type: site.call_type,
                        });
                    }
                    None => {
                        f.cross_file_calls.push(ResolvedCall {
                            name: site.name,
                            file: EXTERNAL_FILE.to_string(),
                            line: site.line,
                            call_type: site.call_type,
                        });
                    }
                }
            }

            for relation in graph.get_callers(&f.name) {
                if relation.caller_file == path {
                    f.local_callers.push(relation.caller);
                } else {
                    f.cross_file_callers.push(ResolvedCall {
                        name: relation.caller,
                        file: relation.caller_file,
                        line: relation.line,
                        call_type: None,
                    });
                }
            }
        }
    }

    files
}

fn build_defining_file_map(files: &[FileContext]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for fc in files {
        for f in &fc.functions {
            map.insert(f.name.clone(), fc.path.clone());
        }
    }
    map
}
