/// Setup and sorting screens.
///
/// Views only read controller state and emit messages; nothing here mutates.
use iced::widget::image::Handle;
use iced::widget::{
    button, column, container, horizontal_space, row, scrollable, text, text_input, Canvas, Column,
};
use iced::{Alignment, Color, Element, Length};
use iced_aw::Wrap;

use super::canvas::ImageCanvas;
use crate::state::controller::Controller;
use crate::state::data::MediaMetadata;
use crate::state::feedback::{Feedback, Level};
use crate::Message;

/// Text field contents on the setup screen
#[derive(Debug, Clone, Default)]
pub struct SetupForm {
    pub source: String,
    pub name: String,
    pub key: String,
    pub path: String,
}

pub fn setup<'a>(controller: &'a Controller, form: &'a SetupForm) -> Element<'a, Message> {
    let busy = controller.is_loading() || controller.is_processing();

    let source_row = row![
        text_input("Source folder", &form.source)
            .on_input(Message::SourceChanged)
            .on_submit(Message::LoadSource)
            .width(Length::Fill),
        button("Browse").on_press(Message::BrowseSource),
        button(if controller.is_loading() { "Loading..." } else { "Load" })
            .on_press_maybe((!busy).then_some(Message::LoadSource)),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let session = controller.session();
    let source_status = match session.source_path() {
        Some(path) if session.restored() => format!(
            "{} images in {} (restored: {} classified, at {})",
            session.items().len(),
            path,
            session.classified_count(),
            session.progress().0
        ),
        Some(path) => format!("{} images in {}", session.items().len(), path),
        None => "No folder loaded".to_string(),
    };

    let mut destination_list = Column::new().spacing(6);
    for dest in controller.destinations().list() {
        destination_list = destination_list.push(
            row![
                text(format!("[{}]", dest.key.to_ascii_uppercase())).width(Length::Fixed(40.0)),
                text(&dest.name).width(Length::Fixed(160.0)),
                text(&dest.path).size(12).width(Length::Fill),
                button("Remove").on_press_maybe((!busy).then_some(Message::RemoveDestination(dest.key))),
            ]
            .spacing(10)
            .align_y(Alignment::Center),
        );
    }
    if controller.destinations().is_empty() {
        destination_list = destination_list.push(text("No destinations yet").size(14));
    }

    let add_row = row![
        text_input("Name", &form.name)
            .on_input(Message::NameChanged)
            .width(Length::Fixed(160.0)),
        text_input("Key", &form.key)
            .on_input(Message::KeyChanged)
            .width(Length::Fixed(60.0)),
        text_input("Destination folder", &form.path)
            .on_input(Message::PathChanged)
            .on_submit(Message::AddDestination)
            .width(Length::Fill),
        button("Browse").on_press(Message::BrowseDestination),
        button("Add").on_press_maybe((!busy).then_some(Message::AddDestination)),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let start = button(text("Start Sorting").size(18))
        .padding(10)
        .on_press_maybe((controller.can_start() && !busy).then_some(Message::StartSorting));

    let content = column![
        text("Media Sorter").size(36),
        source_row,
        text(source_status).size(14),
        text("Destinations").size(22),
        scrollable(destination_list).height(Length::FillPortion(1)),
        add_row,
        start,
        feedback_line(controller.feedback()),
    ]
    .spacing(16)
    .padding(30);

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

pub fn sorting<'a>(controller: &'a Controller, image: Option<&'a Handle>) -> Element<'a, Message> {
    let session = controller.session();
    let processing = controller.is_processing();
    let (position, total) = session.progress();

    let save_status = if session.is_dirty() {
        "Unsaved changes".to_string()
    } else {
        match session.last_saved() {
            Some(at) => format!("Saved {}", at.format("%H:%M:%S")),
            None => "Saved".to_string(),
        }
    };

    let header = row![
        text(format!("Image {position} / {total}")).size(18),
        text(format!("{} classified", session.classified_count())).size(14),
        text(save_status).size(14),
        horizontal_space(),
        button("Save").on_press_maybe((!processing).then_some(Message::Save)),
        button(if processing { "Processing..." } else { "Finalize" })
            .on_press_maybe((!processing).then_some(Message::Finalize)),
        button("New Session").on_press_maybe((!processing).then_some(Message::ResetSession)),
    ]
    .spacing(12)
    .align_y(Alignment::Center);

    let mut body = Column::new().spacing(10).push(header);

    if session.is_at_end() && session.classified_count() > 0 {
        body = body.push(
            text("All images reviewed. Finalize when ready.").color(Color::from_rgb(0.4, 0.8, 0.4)),
        );
    }
    let orphaned = controller.orphaned_count();
    if orphaned > 0 {
        body = body.push(
            text(format!(
                "{orphaned} images point at removed destinations and will be left in place"
            ))
            .color(Color::from_rgb(0.9, 0.7, 0.2)),
        );
    }

    if let Some(item) = session.current_item() {
        let assigned = match session.current_classification() {
            Some(name) => format!("→ {name}"),
            None => String::new(),
        };
        body = body.push(
            row![text(&item.name).size(16), text(assigned).size(16)]
                .spacing(12)
                .align_y(Alignment::Center),
        );
    }

    let viewer: Element<'a, Message> = match (controller.content(), image) {
        (Some(content), Some(handle)) => Canvas::new(ImageCanvas {
            handle,
            dimensions: content.metadata.width.zip(content.metadata.height),
            zoom: controller.viewer().zoom(),
            pan: controller.viewer().pan(),
        })
        .width(Length::Fill)
        .height(Length::Fill)
        .into(),
        _ => match controller.content_error() {
            Some(error) => text(format!("Could not load image: {error}")).into(),
            None => text("Loading...").into(),
        },
    };
    body = body.push(
        container(viewer)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill),
    );

    if let Some(content) = controller.content() {
        body = body.push(text(describe(&content.metadata)).size(12));
    }

    let mut controls = row![
        button("← Previous").on_press_maybe((!processing).then_some(Message::Previous)),
        button("Skip →").on_press_maybe((!processing).then_some(Message::Skip)),
        button("Open").on_press(Message::OpenCurrent),
    ]
    .spacing(10);
    if controller.viewer().is_zoomed() {
        controls = controls.push(button("Reset zoom").on_press(Message::ResetZoom));
    }
    body = body.push(controls);

    let destination_buttons: Vec<Element<'a, Message>> = controller
        .destinations()
        .list()
        .iter()
        .map(|dest| {
            button(text(format!("{} ({})", dest.name, dest.key.to_ascii_uppercase())))
                .padding(8)
                .on_press_maybe((!processing).then(|| Message::Classify(dest.name.clone())))
                .into()
        })
        .collect();
    body = body
        .push(Wrap::with_elements(destination_buttons).spacing(8.0).line_spacing(8.0))
        .push(feedback_line(controller.feedback()));

    container(body.padding(20))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn feedback_line(feedback: Option<&Feedback>) -> Element<'_, Message> {
    match feedback {
        Some(feedback) => {
            let color = match feedback.level {
                Level::Info => Color::from_rgb(0.8, 0.8, 0.8),
                Level::Success => Color::from_rgb(0.4, 0.8, 0.4),
                Level::Warning => Color::from_rgb(0.9, 0.7, 0.2),
                Level::Error => Color::from_rgb(0.9, 0.3, 0.3),
            };
            text(&feedback.text).color(color).into()
        }
        None => text("").into(),
    }
}

/// "2.4 MB · 4000×3000"
pub fn describe(metadata: &MediaMetadata) -> String {
    let size = human_size(metadata.size);
    match (metadata.width, metadata.height) {
        (Some(width), Some(height)) => format!("{size} · {width}×{height}"),
        _ => size,
    }
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
