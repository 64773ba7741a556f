//! Command handlers.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use coursedesk_lib::AdminClient;
use coursedesk_lib::api::ListQuery;
use coursedesk_lib::api::NotificationApi;
use coursedesk_lib::api::Resource;
use coursedesk_lib::feed::FeedOptions;
use coursedesk_lib::feed::NoAlert;
use coursedesk_lib::feed::NotificationFeed;
use coursedesk_lib::feed::WsConnector;
use coursedesk_lib::model::Notification;
use coursedesk_lib::model::Row;
use coursedesk_lib::model::UserProfile;
use coursedesk_lib::table::ActionMenu;
use coursedesk_lib::table::CellValue;
use coursedesk_lib::table::Column;
use coursedesk_lib::table::ColumnKind;
use coursedesk_lib::table::PaginationState;
use coursedesk_lib::table::SelectionSet;
use coursedesk_lib::table::TableEngine;
use coursedesk_lib::table::TableProps;
use log::info;
use log::warn;

use crate::args::Command;
use crate::args::ListArgs;
use crate::args::NotificationCommand;
use crate::error::CliError;
use crate::render;
use crate::terminal::BellAlert;
use crate::terminal::PromptConfirm;
use crate::terminal::prompt;

const USER_SEARCH_FIELDS: &[&str] = &["name", "email"];
const FLUSH_TIMEOUT: Duration = Duration::from_secs(3);

pub async fn dispatch(client: &AdminClient, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login { email, password } => login(client, &email, password).await,
        Command::Logout => logout(client).await,
        Command::Users(args) => users(client, &args).await,
        Command::Notifications(command) => {
            require_session(client)?;
            match command {
                NotificationCommand::List(args) => list_notifications(client, &args).await,
                NotificationCommand::Watch => watch(client).await,
                NotificationCommand::Read { id } => mark_read(client, &id).await,
                NotificationCommand::Delete { id, yes } => delete(client, &id, yes).await,
            }
        }
    }
}

fn require_session(client: &AdminClient) -> Result<(), CliError> {
    match client.session().token() {
        Some(_) => Ok(()),
        None => Err(CliError::NotLoggedIn),
    }
}

// =============================================================================
// Session
// =============================================================================

async fn login(
    client: &AdminClient,
    email: &str,
    password: Option<String>,
) -> Result<(), CliError> {
    let password = match password {
        Some(password) => password,
        None => prompt("Password: ").await?,
    };
    let user = client.login(email, &password).await?;
    println!("Logged in as {}", user.display_name());
    Ok(())
}

async fn logout(client: &AdminClient) -> Result<(), CliError> {
    if client.session().token().is_none() {
        println!("Not logged in");
        return Ok(());
    }
    if let Err(e) = client.logout().await {
        // Local session is already cleared.
        warn!("Logout request failed: {}", e);
    }
    println!("Logged out");
    Ok(())
}

// =============================================================================
// Lists
// =============================================================================

fn query_for(args: &ListArgs, search_fields: &[&str]) -> ListQuery {
    let query = ListQuery::new(args.page.saturating_sub(1), args.limit.max(1));
    match &args.search {
        Some(term) => query.search(term.as_str()).search_fields(search_fields),
        None => query,
    }
}

/// Builds the table with every `hide` key hidden, whatever its default.
fn table_engine<T: Row>(columns: Vec<Column<T>>, hide: &[String]) -> TableEngine<T> {
    let mut engine = TableEngine::new(columns, ActionMenu::default());
    for key in hide {
        if !engine.set_visible(key, false) {
            warn!("Unknown column '{}'", key);
            eprintln!("Unknown column '{}'", key);
        }
    }
    engine
}

/// Fetches one page and draws it with `columns`.
async fn show_list<T>(
    client: &AdminClient,
    resource: Resource,
    columns: Vec<Column<T>>,
    args: &ListArgs,
    search_fields: &[&str],
    title: &str,
) -> Result<(), CliError>
where
    T: Row + serde::de::DeserializeOwned,
{
    require_session(client)?;

    let engine = table_engine(columns, &args.hide);

    let query = query_for(args, search_fields);
    let page = client.list::<T>(resource, &query).await?;
    info!("Fetched {} of {} from {}", page.len(), page.total(), resource.path());

    let selection = SelectionSet::default();
    let props = TableProps::new(
        page.records(),
        PaginationState::new(query.page, query.limit, page.total()),
        &selection,
    )
    .search(args.search.as_deref().unwrap_or_default())
    .header_content(title);

    print!("{}", render::table(&engine.render(props)));
    Ok(())
}

fn user_columns() -> Vec<Column<UserProfile>> {
    vec![
        Column::new("Email", "email", |u: &UserProfile| u.email.as_str().into()),
        Column::new("Name", "name", |u: &UserProfile| u.name.clone().into()),
        Column::new("Role", "role", |u: &UserProfile| u.role_label().into()),
        Column::new("Active", "isActive", |u: &UserProfile| u.is_active.into())
            .kind(ColumnKind::Badge),
        Column::new("Avatar", "avatar", |u: &UserProfile| u.avatar.clone().into())
            .kind(ColumnKind::ImagePreview)
            .hidden(),
    ]
}

fn notification_columns() -> Vec<Column<Notification>> {
    vec![
        Column::new("Id", "_id", |n: &Notification| n.id.as_str().into()),
        Column::new("Unread", "status", |n: &Notification| n.is_unread().into())
            .kind(ColumnKind::Badge),
        Column::new("Message", "message", |n: &Notification| n.plain_message().into()),
        Column::new("Created", "createdAt", |n: &Notification| {
            n.created_at
                .map(|at| CellValue::from(at.format("%Y-%m-%d %H:%M").to_string()))
                .unwrap_or(CellValue::Empty)
        }),
    ]
}

async fn users(client: &AdminClient, args: &ListArgs) -> Result<(), CliError> {
    show_list(
        client,
        Resource::Users,
        user_columns(),
        args,
        USER_SEARCH_FIELDS,
        "Users",
    )
    .await
}

async fn list_notifications(client: &AdminClient, args: &ListArgs) -> Result<(), CliError> {
    show_list(
        client,
        Resource::Notifications,
        notification_columns(),
        args,
        &["message"],
        "Notifications",
    )
    .await
}

// =============================================================================
// Live feed
// =============================================================================

async fn mount_feed(
    client: &AdminClient,
    options: FeedOptions,
    assume_yes: bool,
) -> Result<NotificationFeed, CliError> {
    let connector = WsConnector::from_config(client.config())?;
    let api: Arc<dyn NotificationApi> = Arc::new(client.clone());
    Ok(NotificationFeed::mount(
        api,
        &connector,
        Arc::new(PromptConfirm::new(assume_yes)),
        options,
    )
    .await)
}

async fn watch(client: &AdminClient) -> Result<(), CliError> {
    let options = FeedOptions::from_config(client.config()).alert(Arc::new(BellAlert));
    let feed = mount_feed(client, options, false).await?;

    let mut seen: HashSet<String> = HashSet::new();
    for notification in feed.notifications() {
        println!("{}", render::notification_line(&notification));
        seen.insert(notification.id);
    }
    let counts = feed.counts();
    println!("{} unread, {} total. Ctrl+C to stop.", counts.unread, counts.total);

    let mut updates = feed.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                for notification in state.items().iter().filter(|n| !seen.contains(&n.id)) {
                    println!("{}", render::notification_line(notification));
                }
                seen = state.items().iter().map(|n| n.id.clone()).collect();
                println!("{} unread, {} total", state.unread_count(), state.total());
            }
        }
    }

    feed.unmount().await;
    Ok(())
}

/// Gives the socket a bounded chance to send peer events before teardown.
async fn flush_and_unmount(feed: NotificationFeed) {
    if !feed.flush(FLUSH_TIMEOUT).await {
        warn!("Peer sync event not delivered before exit");
        eprintln!("warning: other sessions were not notified of this change");
    }
    feed.unmount().await;
}

async fn mark_read(client: &AdminClient, id: &str) -> Result<(), CliError> {
    let options = FeedOptions::from_config(client.config()).alert(Arc::new(NoAlert));
    let feed = mount_feed(client, options, false).await?;
    let result = feed.mark_as_read(id).await;
    let unread = feed.unread_count();
    flush_and_unmount(feed).await;

    result?;
    println!("Marked {} as read ({} unread)", id, unread);
    Ok(())
}

async fn delete(client: &AdminClient, id: &str, yes: bool) -> Result<(), CliError> {
    let feed = mount_feed(client, FeedOptions::from_config(client.config()), yes).await?;
    let result = feed.delete_notification(id).await;
    flush_and_unmount(feed).await;

    if result? {
        println!("Deleted {}", id);
    } else {
        println!("Kept {}", id);
    }
    Ok(())
}
