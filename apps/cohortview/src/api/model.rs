//! # Metrics Page Model
//!
//! One render pass of the metrics page, shared by the HTML page, the CSV
//! export and the JSON chart endpoint. Each step either feeds the next or
//! stops with a notice:
//!
//! upload state → required columns → metric options → selection → chart

use cohortview_core::{
    CohortError, Compositor, MetricsView, Notice, Selection, SelectionOptions, SelectionRequest,
    Session,
};

/// Everything the metrics page needs for one render.
#[derive(Debug, Clone, Default)]
pub struct MetricsModel {
    /// Messages in display order.
    pub notices: Vec<Notice>,
    /// Selector contents; `None` until the cohort has metrics.
    pub options: Option<SelectionOptions>,
    /// Resolved selection, used to pre-fill the controls.
    pub selection: Option<Selection>,
    /// Chart and table; `None` whenever a step stopped early.
    pub view: Option<MetricsView>,
    /// The error that stopped the pass, if any.
    pub error: Option<CohortError>,
    /// Whether a parsed file is available.
    pub has_upload: bool,
}

impl MetricsModel {
    /// Run the metrics pass against the session.
    pub fn build(session: &Session, request: &SelectionRequest) -> Self {
        let mut model = Self {
            notices: vec![session.upload_notice()],
            ..Self::default()
        };

        let Some(cleaned) = session.cohort() else {
            return model;
        };
        model.has_upload = true;

        let cohort = match cleaned {
            Ok(cohort) => cohort,
            Err(e) => {
                tracing::warn!(error = %e, "Uploaded table rejected");
                return model.stop(e);
            }
        };

        if cohort.dropped_rows() > 0 {
            tracing::info!(
                dropped = cohort.dropped_rows(),
                kept = cohort.row_count(),
                "Dropped rows with unreadable age"
            );
            model.notices.push(Notice::info(format!(
                "{} row(s) dropped because their age could not be read",
                cohort.dropped_rows()
            )));
        }

        let options = match SelectionOptions::from_cohort(&cohort) {
            Ok(options) => options,
            Err(e) => return model.stop(e),
        };
        model.options = Some(options.clone());

        let selection = match Selection::resolve(request, &options, &cohort) {
            Ok(selection) => selection,
            Err(e) => return model.stop(e),
        };
        model.selection = Some(selection.clone());

        match Compositor::compose_selection(&cohort, options, selection) {
            Ok(view) => model.view = Some(view),
            Err(e) => return model.stop(e),
        }
        model
    }

    fn stop(mut self, error: CohortError) -> Self {
        if error.is_warning() {
            tracing::debug!(warning = %error, "Metrics view halted");
        }
        self.notices.push(Notice::from(&error));
        self.error = Some(error);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohortview_core::NoticeLevel;

    #[test]
    fn no_upload_gives_info_prompt() {
        let model = MetricsModel::build(&Session::new(), &SelectionRequest::default());
        assert!(!model.has_upload);
        assert_eq!(model.notices.len(), 1);
        assert_eq!(model.notices[0].level, NoticeLevel::Info);
        assert!(model.view.is_none());
    }

    #[test]
    fn missing_columns_stop_with_error() {
        let mut session = Session::new();
        session.upload("x.csv", b"Weight\n1\n").expect("upload");
        let model = MetricsModel::build(&session, &SelectionRequest::default());
        assert!(matches!(model.error, Some(CohortError::MissingColumns(_))));
        assert_eq!(model.notices[0].level, NoticeLevel::Success);
        assert_eq!(model.notices[1].level, NoticeLevel::Error);
        assert!(model.options.is_none());
    }

    #[test]
    fn empty_selection_keeps_controls() {
        let mut session = Session::new();
        session
            .upload("x.csv", b"Age,Gender,Weight\n3,M,1\n6,F,2\n")
            .expect("upload");
        let request = SelectionRequest {
            ages: Some(vec![]),
            ..SelectionRequest::default()
        };
        let model = MetricsModel::build(&session, &request);
        assert_eq!(model.error, Some(CohortError::EmptySelection));
        assert!(model.options.is_some());
        assert!(model.selection.is_some());
        assert!(model.view.is_none());
    }

    #[test]
    fn dropped_rows_are_reported() {
        let mut session = Session::new();
        session
            .upload("x.csv", b"Age,Gender,Weight\n3,M,1\n?,F,2\n")
            .expect("upload");
        let model = MetricsModel::build(&session, &SelectionRequest::default());
        assert!(model.view.is_some());
        assert!(
            model
                .notices
                .iter()
                .any(|n| n.level == NoticeLevel::Info && n.message.starts_with("1 row"))
        );
    }
}
