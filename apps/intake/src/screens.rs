//! Terminal rendering of each screen. Prompts block; flow calls are awaited in between.

use std::fmt;

use anyhow::Result;
use client_core::{
    CategoryProgress, FlowError, IntakeFormStep, Screen, ScreenFlow, ScreenKind,
    SessionListing, Wizard,
};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use shared::domain::{FieldKey, FieldValue, IntakeFormData};
use tracing::warn;

const BAR_WIDTH: usize = 12;

enum Next {
    Stay,
    Quit,
}

pub async fn run(flow: &mut ScreenFlow) -> Result<()> {
    let theme = ColorfulTheme::default();
    loop {
        let next = match flow.kind() {
            ScreenKind::OpenSessions => open_sessions(flow, &theme).await?,
            ScreenKind::Intro => intro(flow, &theme).await?,
            ScreenKind::Resume => resume(flow, &theme)?,
            ScreenKind::Form => form_step(flow, &theme).await?,
            ScreenKind::Complete => complete(flow, &theme).await?,
        };
        if let Next::Quit = next {
            return Ok(());
        }
    }
}

async fn open_sessions(flow: &mut ScreenFlow, theme: &ColorfulTheme) -> Result<Next> {
    if matches!(
        flow.screen(),
        Screen::OpenSessions {
            sessions: SessionListing::Loading,
            ..
        }
    ) {
        report(flow.refresh_sessions().await);
        return Ok(Next::Stay);
    }

    let (open, submitted_count) = match flow.screen() {
        Screen::OpenSessions {
            sessions: SessionListing::Failed(message),
            ..
        } => {
            print_error(format!("could not load sessions: {message}"));
            (Vec::new(), 0)
        }
        Screen::OpenSessions {
            sessions: SessionListing::Loaded { open, submitted },
            ..
        } => (open.clone(), submitted.len()),
        _ => return Ok(Next::Stay),
    };

    if submitted_count > 0 {
        print_info(format!("{submitted_count} questionnaire(s) already submitted"));
    }

    let mut labels = vec!["Start a new questionnaire".to_string()];
    labels.extend(open.iter().map(session_label));
    labels.push("Refresh".into());
    labels.push("Quit".into());

    let choice = Select::with_theme(theme)
        .with_prompt("Open sessions")
        .items(&labels)
        .default(0)
        .interact_opt()?;

    match choice {
        Some(0) => report(flow.create_new()),
        Some(index) if index <= open.len() => {
            if let Some(form_id) = &open[index - 1].id {
                report(flow.resume_session(form_id));
            }
        }
        Some(index) if index == open.len() + 1 => report(flow.refresh_sessions().await),
        _ => return Ok(Next::Quit),
    }
    Ok(Next::Stay)
}

async fn intro(flow: &mut ScreenFlow, theme: &ColorfulTheme) -> Result<Next> {
    print_info("Answer a few questions so we can match you with a therapist.");
    let autosave = Confirm::with_theme(theme)
        .with_prompt("Save your answers as you go?")
        .default(intro_autosave(flow.screen()))
        .interact()?;

    report(flow.set_autosave(autosave));
    report(flow.start().await);
    Ok(Next::Stay)
}

/// The intro keeps whatever autosave choice the session list carried over.
fn intro_autosave(screen: &Screen) -> bool {
    matches!(screen, Screen::Intro { autosave: true, .. })
}

fn resume(flow: &mut ScreenFlow, theme: &ColorfulTheme) -> Result<Next> {
    if let Screen::Resume { record } = flow.screen() {
        print_info(format!(
            "Welcome back. {} of {} questions answered.",
            record.answered_count(),
            FieldKey::ALL.len()
        ));
    }

    let choice = Select::with_theme(theme)
        .with_prompt("Where do you want to continue?")
        .items(&["Go to the next unanswered question", "Review saved answers"])
        .default(0)
        .interact()?;

    if choice == 0 {
        report(flow.skip_to_unanswered());
    } else {
        report(flow.review_answers());
    }
    Ok(Next::Stay)
}

enum FormAction {
    Answer(FieldValue),
    Toggle(String),
    Next,
    Back,
    EnableAutosave,
    Quit,
}

async fn form_step(flow: &mut ScreenFlow, theme: &ColorfulTheme) -> Result<Next> {
    let Some(wizard) = flow.wizard() else {
        return Ok(Next::Stay);
    };
    println!("{}", render_progress(&wizard.progress()));
    let action = choose_form_action(wizard, theme)?;

    match action {
        FormAction::Answer(value) => report(flow.answer(value).await),
        FormAction::Toggle(option) => report(flow.toggle_option(&option).await),
        FormAction::Next => report(flow.next().await),
        FormAction::Back => report(flow.previous()),
        FormAction::EnableAutosave => report(flow.enable_autosave().await),
        FormAction::Quit => return Ok(Next::Quit),
    }
    Ok(Next::Stay)
}

fn choose_form_action(wizard: &Wizard, theme: &ColorfulTheme) -> Result<FormAction> {
    let step = wizard.current_step();
    let selected = match wizard.current_value() {
        Some(FieldValue::Multi(values)) => values,
        Some(FieldValue::Single(value)) => vec![value],
        None => Vec::new(),
    };

    let mut labels: Vec<String> = step
        .options
        .iter()
        .map(|option| {
            let mark = if selected.contains(&option.value) { "[x]" } else { "[ ]" };
            format!("{mark} {}", option.label)
        })
        .collect();
    let mut extras = Vec::new();
    if wizard.shows_next() {
        extras.push(("Next", FormAction::Next));
    }
    if wizard.can_retreat() {
        extras.push(("Back", FormAction::Back));
    }
    if !wizard.autosave_enabled() {
        extras.push(("Save answers as I go", FormAction::EnableAutosave));
    }
    extras.push(("Quit", FormAction::Quit));
    labels.extend(extras.iter().map(|(label, _)| label.to_string()));

    let default = step
        .options
        .iter()
        .position(|option| selected.contains(&option.value))
        .unwrap_or(0);
    let choice = Select::with_theme(theme)
        .with_prompt(question_prompt(wizard, step))
        .items(&labels)
        .default(default)
        .interact_opt()?;

    let Some(index) = choice else {
        return Ok(FormAction::Back);
    };
    if let Some(option) = step.options.get(index) {
        return Ok(if step.multiselect {
            FormAction::Toggle(option.value.clone())
        } else {
            FormAction::Answer(FieldValue::Single(option.value.clone()))
        });
    }
    let extra = index - step.options.len();
    Ok(extras
        .into_iter()
        .nth(extra)
        .map(|(_, action)| action)
        .unwrap_or(FormAction::Quit))
}

async fn complete(flow: &mut ScreenFlow, theme: &ColorfulTheme) -> Result<Next> {
    if let Screen::Complete { record } = flow.screen() {
        print_summary(record);
    }
    let email: String = Input::with_theme(theme)
        .with_prompt("Email address for your matches")
        .allow_empty(true)
        .interact_text()?;

    match flow.submit(&email).await {
        Ok(saved) => {
            let id = saved.id.map(|id| id.to_string()).unwrap_or_default();
            print_success(format!("Thank you! Questionnaire {id} submitted."));
        }
        Err(error) => print_error(error),
    }
    Ok(Next::Stay)
}

fn question_prompt(wizard: &Wizard, step: &IntakeFormStep) -> String {
    let hint = if step.multiselect {
        " (pick all that apply)"
    } else {
        ""
    };
    format!(
        "{}/{} {}{hint}",
        wizard.step_index() + 1,
        wizard.step_count(),
        step.question
    )
}

fn render_progress(progress: &[CategoryProgress]) -> String {
    progress
        .iter()
        .filter(|category| category.is_visible())
        .map(|category| {
            let filled = (category.fill_ratio() * BAR_WIDTH as f32).round() as usize;
            format!(
                "{} [{}{}]",
                category.category.label(),
                "#".repeat(filled),
                "-".repeat(BAR_WIDTH - filled.min(BAR_WIDTH))
            )
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn session_label(record: &IntakeFormData) -> String {
    let id = record
        .id
        .as_ref()
        .map(|id| id.short().to_string())
        .unwrap_or_else(|| "unsaved".into());
    format!(
        "Session #{id} ({}/{} answered)",
        record.answered_count(),
        FieldKey::ALL.len()
    )
}

fn print_summary(record: &IntakeFormData) {
    print_info("All questions answered:");
    for field in FieldKey::ALL {
        let answer = match record.get(field) {
            Some(FieldValue::Single(value)) => value,
            Some(FieldValue::Multi(values)) if values.is_empty() => "-".into(),
            Some(FieldValue::Multi(values)) => values.join(", "),
            None => "-".into(),
        };
        println!("  {field}: {answer}");
    }
}

fn report(result: Result<(), FlowError>) {
    if let Err(error) = result {
        if let FlowError::Client(client) = &error {
            warn!(%client, "intake form request failed");
        }
        print_error(error);
    }
}

fn print_info(message: impl fmt::Display) {
    println!("{message}");
}

fn print_success(message: impl fmt::Display) {
    println!("✔ {message}");
}

fn print_error(message: impl fmt::Display) {
    eprintln!("error: {message}");
}
