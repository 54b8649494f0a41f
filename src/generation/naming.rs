use uuid::Uuid;

/// `<template_id>_<uuid v4><extension>`. The random part is what keeps
/// concurrent generations from colliding in the shared output directory.
pub fn artifact_name(template_id: &str, extension: &str) -> String {
    let extension = extension.trim_start_matches('.');
    format!("{}_{}.{}", template_id, Uuid::new_v4(), extension)
}
