use anyhow::{anyhow, Context};
use threadline_client::{
    api::{AuthToken, ChapterId, NodeId, Page, ReportReason, ReviewMeta, SubjectRef, Uuid, Verb},
    http::HttpCollaborator,
    Node, Thread,
};

#[derive(structopt::StructOpt)]
struct Opt {
    #[structopt(short, long, default_value = "http://127.0.0.1:5000")]
    host: String,

    /// Thread to work on: chapter:ID, news:ID, paragraph:CHAPTER:INDEX, novel:ID or review:ID
    #[structopt(short, long, default_value = "chapter:1")]
    subject: SubjectRef,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Print the thread
    Show {
        #[structopt(long, default_value = "1")]
        page: u32,

        #[structopt(long, default_value = "10")]
        limit: u32,

        /// Also print the replies of these nodes
        #[structopt(short, long)]
        expand: Vec<u64>,

        /// Print every reply, at any depth
        #[structopt(long)]
        all: bool,
    },

    /// Like or dislike a node
    React {
        node: u64,

        /// like or dislike
        verb: Verb,
    },

    /// Post a new root, or a review when the subject is a novel
    Comment {
        content: String,

        /// Review rating, from 1 to 5
        #[structopt(long)]
        rating: Option<u8>,

        /// Mark the review as recommending the novel
        #[structopt(long)]
        recommend: bool,
    },

    /// Reply to a node
    Reply { parent: u64, content: String },

    /// Replace the content of one of your nodes
    Edit { node: u64, content: String },

    /// Report a node to the moderators
    Report {
        node: u64,

        /// One of spoilers, abuse, spam, copyright, discrimination or delete-own
        reason: ReportReason,
    },

    /// Print the number of comments on each paragraph of a chapter
    ParagraphCounts { chapter: u64 },

    /// Print the user the token belongs to
    Whoami,
}

fn token() -> anyhow::Result<Option<AuthToken>> {
    let tok = match std::env::var("THREADLINE_TOKEN") {
        Ok(tok) => tok,
        Err(std::env::VarError::NotPresent) => return Ok(None),
        Err(e) => return Err(e).context("retrieving THREADLINE_TOKEN environment variable"),
    };
    let tok = Uuid::try_parse(&tok).context("parsing THREADLINE_TOKEN as an auth token")?;
    Ok(Some(AuthToken(tok)))
}

/// Loads the replies of every node that has any
async fn load_all(thread: &Thread<HttpCollaborator>) -> anyhow::Result<()> {
    let with_replies = |nodes: &[std::sync::Arc<Node>]| {
        nodes
            .iter()
            .filter(|n| n.display_count() > 0)
            .map(|n| n.id)
            .collect::<Vec<_>>()
    };
    let mut todo = with_replies(&thread.tree().roots);
    while let Some(id) = todo.pop() {
        thread
            .expand(id)
            .await
            .with_context(|| format!("loading replies of {id}"))?;
        let tree = thread.tree();
        if let Some(children) = tree.find(id).and_then(|n| n.children.as_deref()) {
            todo.extend(with_replies(children));
        }
    }
    Ok(())
}

/// Mounts the thread and loads it fully, checking `node` is part of it
async fn locate(thread: &Thread<HttpCollaborator>, node: NodeId) -> anyhow::Result<()> {
    thread
        .mount(Page::largest())
        .await
        .context("listing roots")?;
    if thread.tree().find(node).is_none() {
        load_all(thread).await?;
    }
    match thread.tree().find(node) {
        Some(_) => Ok(()),
        None => Err(anyhow!("node {node} is not in {}", thread.subject())),
    }
}

fn print(thread: &Thread<HttpCollaborator>) {
    let tree = thread.tree();
    println!(
        "{}: {} roots, {}% liked, {} likes",
        thread.subject(),
        tree.stats.total,
        tree.stats.like_rate,
        tree.stats.total_likes
    );
    if let Some(r) = tree.stats.reviews {
        let average = match r.average_rating() {
            Some(avg) => format!("{avg:.1}"),
            None => String::from("-"),
        };
        println!(
            "{} reviews, rated {average} on average, {} recommend ({}%)",
            r.count,
            r.recommended_count,
            r.recommendation_rate()
        );
    }
    tree.walk(|n, depth| {
        let indent = "    ".repeat(depth);
        let edited = match n.edited_at {
            Some(_) => " (edited)",
            None => "",
        };
        println!(
            "{indent}#{} {} at {}{edited}  +{} -{}  {} replies",
            n.id,
            n.author.name,
            n.created_at.format("%Y-%m-%d %H:%M"),
            n.like_count,
            n.dislike_count,
            n.display_count(),
        );
        for line in n.content.lines() {
            println!("{indent}  {line}");
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let opt = <Opt as structopt::StructOpt>::from_args();

    let collab = HttpCollaborator::new(opt.host, opt.subject, token()?);
    let thread = Thread::new(collab);

    match opt.cmd {
        Command::Show {
            page,
            limit,
            expand,
            all,
        } => {
            thread
                .mount(Page { page, limit })
                .await
                .context("listing roots")?;
            if all {
                load_all(&thread).await?;
            }
            for id in expand {
                thread
                    .expand(NodeId(id))
                    .await
                    .with_context(|| format!("loading replies of {id}"))?;
            }
            print(&thread);
        }
        Command::React { node, verb } => {
            let node = NodeId(node);
            locate(&thread, node).await?;
            let res = thread.react(node, verb).await.context("reacting")?;
            match res.counts {
                Some(c) => println!("{:?}: +{} -{}", res.action, c.like_count, c.dislike_count),
                None => println!("{:?}", res.action),
            }
        }
        Command::Comment {
            content,
            rating,
            recommend,
        } => {
            let hint = thread.hint(&content, None);
            if !hint.is_enough() {
                return Err(anyhow!("comment is too short: {hint}"));
            }
            let id = match opt.subject {
                SubjectRef::Novel(_) => {
                    if rating.map_or(false, |r| !(1..=5).contains(&r)) {
                        return Err(anyhow!("rating must be between 1 and 5"));
                    }
                    let review = ReviewMeta {
                        rating,
                        is_recommended: recommend,
                    };
                    thread.submit_review(&content, review).await
                }
                _ if rating.is_some() || recommend => {
                    return Err(anyhow!("only reviews of a novel carry a rating"));
                }
                _ => thread.submit_root(&content).await,
            }
            .context("posting")?;
            println!("posted #{id}");
        }
        Command::Reply { parent, content } => {
            let parent = NodeId(parent);
            let hint = thread.hint(&content, Some(parent));
            if !hint.is_enough() {
                return Err(anyhow!("reply is too short: {hint}"));
            }
            locate(&thread, parent).await?;
            let id = thread
                .submit_reply(parent, &content)
                .await
                .context("replying")?;
            println!("posted #{id}");
        }
        Command::Edit { node, content } => {
            let node = NodeId(node);
            locate(&thread, node).await?;
            thread.begin_edit(node)?;
            if !thread.set_draft(content) {
                return Err(anyhow!("node {node} is not being edited"));
            }
            thread.save_edit().await.context("saving edit")?;
            println!("edited #{node}");
        }
        Command::Report { node, reason } => {
            thread
                .report(NodeId(node), reason)
                .await
                .context("reporting")?;
            println!("reported #{node} for {reason}");
        }
        Command::ParagraphCounts { chapter } => {
            let counts = thread
                .collaborator()
                .paragraph_comment_counts(ChapterId(chapter))
                .await
                .context("fetching paragraph counts")?;
            for (index, count) in counts {
                println!("paragraph {index}: {count}");
            }
        }
        Command::Whoami => {
            let user = thread.collaborator().whoami().await.context("whoami")?;
            println!("{} ({})", user.name, user.id.0);
        }
    }

    Ok(())
}
