use crate::shared::transform_request::TransformRequest;

use super::fade_window::FadeWindow;
use super::resolution_target::{resolve_targets, ResolutionTarget};
use super::transpose_mode::TransposeMode;

/// Filter arguments for one output resolution of one input file.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterPlan {
    pub target: ResolutionTarget,
    /// `transpose, scale, fade`, empty when no video stage applies.
    pub video_chain: String,
    /// `afade` only, shared by every plan of the same input file.
    pub audio_chain: String,
}

impl FilterPlan {
    /// `-filter:v` / `-filter:a` pairs for the non-empty chains.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(4);
        if !self.video_chain.is_empty() {
            args.push("-filter:v".to_string());
            args.push(self.video_chain.clone());
        }
        if !self.audio_chain.is_empty() {
            args.push("-filter:a".to_string());
            args.push(self.audio_chain.clone());
        }
        args
    }
}

/// Builds the per-resolution filter table for a request.
///
/// Transpose and scale only depend on the request and are resolved once per
/// batch; the fade stage depends on each file's duration and is added in
/// [`FilterComposer::compose`].
pub struct FilterComposer {
    transpose: Option<TransposeMode>,
    targets: Vec<ResolutionTarget>,
}

impl FilterComposer {
    pub fn new(request: &TransformRequest) -> Self {
        Self {
            transpose: request.transpose(),
            targets: resolve_targets(request.scale()),
        }
    }

    pub fn targets(&self) -> &[ResolutionTarget] {
        &self.targets
    }

    /// One plan per target, in target order.
    ///
    /// Scaling comes after the transpose so that quarter turns never see
    /// swapped dimensions.
    pub fn compose(&self, fade: Option<&FadeWindow>) -> Vec<FilterPlan> {
        let transpose = self.transpose.map(|mode| mode.filter());
        let fade_video = fade.map(FadeWindow::video_filter);
        let audio_chain = fade.map(FadeWindow::audio_filter).unwrap_or_default();

        self.targets
            .iter()
            .map(|target| FilterPlan {
                target: *target,
                video_chain: join_chain(&[transpose, target.scale_filter(), fade_video.as_deref()]),
                audio_chain: audio_chain.clone(),
            })
            .collect()
    }
}

/// Comma-join the present, non-empty stages.
fn join_chain(stages: &[Option<&str>]) -> String {
    stages
        .iter()
        .flatten()
        .map(|stage| stage.trim_matches(','))
        .filter(|stage| !stage.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}
